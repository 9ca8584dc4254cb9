use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use zerosum::{run_recon, ReconConfig, Table};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The path of the candidate match-pairs CSV file
    #[clap(long, value_parser)]
    pairs: PathBuf,

    /// The path of the combined (all source records) CSV file
    #[clap(long, value_parser)]
    combined: PathBuf,

    /// The path to write the output CSV file to
    #[clap(short, long, value_parser)]
    output: PathBuf,

    /// The column in `combined` holding each record's unique id
    #[clap(long, value_parser)]
    #[arg(default_value = "unique_id")]
    unique_id_column: String,

    /// The column in `combined` holding the numeric amount to sum
    #[clap(short, long, value_parser)]
    #[arg(default_value = "amount")]
    amount_column: String,

    /// Allowed absolute deviation from zero within a cluster
    #[clap(long, value_parser)]
    #[arg(default_value_t = 0.01)]
    tolerance: f64,

    /// Comma-separated grouping columns; defaults to every non-reserved
    /// column on `combined` when omitted
    #[clap(short, long, value_parser, value_delimiter = ',')]
    grouping_columns: Vec<String>,
}

pub fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let pairs = Table::from_csv_path(&args.pairs).expect("failed to read pairs CSV");
    let combined = Table::from_csv_path(&args.combined).expect("failed to read combined CSV");

    let config = ReconConfig {
        amount_column: args.amount_column,
        tolerance: args.tolerance,
        mapped_columns: args.grouping_columns,
    };

    let sink = |msg: &str| println!("{msg}");

    let start = Instant::now();
    let outcome =
        run_recon(&pairs, &combined, &args.unique_id_column, &config, &sink).expect("recon run failed");
    let elapsed = start.elapsed();

    println!("Time spent: {:.2}s", elapsed.as_secs_f64());
    println!("Clusters reconciled: {}", outcome.clusters_found);
    println!("Solutions found: {}", outcome.groups_found);
    if !outcome.failed_clusters.is_empty() {
        println!("Clusters skipped due to errors: {}", outcome.failed_clusters.len());
    }

    let out = combined
        .subset_rows(&outcome.kept_rows)
        .with_column("cluster_id", outcome.cluster_ids)
        .with_column("recon_group", outcome.recon_groups);
    out.write_csv(&args.output).expect("failed to write output CSV");
}
