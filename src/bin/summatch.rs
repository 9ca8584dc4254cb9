use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use zerosum::engine::SubsetMode;
use zerosum::{Engine, EngineConfig, Table};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The path of the input CSV file
    #[clap(short, long, value_parser)]
    input: PathBuf,

    /// The path to write the output CSV file to
    #[clap(short, long, value_parser)]
    output: PathBuf,

    /// Comma-separated list of categorical grouping columns
    #[clap(short, long, value_parser, value_delimiter = ',')]
    grouping_columns: Vec<String>,

    /// The column holding the numeric amount to sum
    #[clap(short, long, value_parser)]
    #[arg(default_value = "amount")]
    amount_column: String,

    /// The sum every reported subset must (within tolerance) hit
    #[clap(short, long, value_parser)]
    #[arg(default_value_t = 0.0)]
    target: f64,

    /// Allowed absolute deviation from the target
    #[clap(long, value_parser)]
    #[arg(default_value_t = 0.01)]
    tolerance: f64,

    /// Expand columns in declared order instead of by smallest domain first
    #[clap(long, value_parser)]
    #[arg(default_value_t = false)]
    static_ordering: bool,

    /// Use the all-subsets-by-cardinality generator instead of the default
    /// recursive-removal generator
    #[clap(long, value_parser)]
    #[arg(default_value_t = false)]
    new_mode: bool,
}

pub fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let raw = Table::from_csv_path(&args.input).expect("failed to read input CSV");

    let config = EngineConfig::new(args.grouping_columns, args.amount_column, args.target, args.tolerance)
        .with_static_ordering(args.static_ordering)
        .with_subset_mode(if args.new_mode { SubsetMode::New } else { SubsetMode::Original });

    let mut engine = Engine::new(raw.clone(), config);
    engine.set_progress_sink(|msg| println!("{msg}"));

    engine.prepare().expect("failed to prepare engine");

    let start = Instant::now();
    engine.search();
    let elapsed = start.elapsed();

    let solutions = engine.results();
    println!("Time spent: {:.2}s", elapsed.as_secs_f64());
    if solutions.is_empty() {
        println!("No solution was found");
    } else {
        println!("Solutions found: {}", solutions.len());
    }

    let labels = engine.solution_labels();
    let out = raw.with_column("solution_set", labels);
    out.write_csv(&args.output).expect("failed to write output CSV");
}
