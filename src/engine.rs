//! Public facade: configure a table, prepare it, search it, read results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attribution;
use crate::bfs;
use crate::column_encoder::{self, EncodedTable};
use crate::error::EngineError;
use crate::registry::{Registry, Solution};
use crate::rule::RuleKey;
use crate::table::Table;

/// Which subset-enumeration strategy `state::process_state` branches with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsetMode {
    /// Recursive single-element removal with a mirror fast path at each step.
    #[default]
    Original,
    /// All subsets of the available categories, largest cardinality first,
    /// with a dominance-pruned candidate list.
    New,
}

/// Built the same way as the teacher's own `Configuration` (chained setters,
/// `serde`-derived so recon mode can carry it across per-cluster engine
/// invocations unchanged).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grouping_columns: Vec<String>,
    pub amount_column: String,
    pub target: f64,
    pub tolerance: f64,
    pub static_ordering: bool,
    pub subset_mode: SubsetMode,
}

impl EngineConfig {
    pub fn new(
        grouping_columns: Vec<String>,
        amount_column: impl Into<String>,
        target: f64,
        tolerance: f64,
    ) -> Self {
        Self {
            grouping_columns,
            amount_column: amount_column.into(),
            target,
            tolerance,
            static_ordering: false,
            subset_mode: SubsetMode::Original,
        }
    }

    pub fn with_static_ordering(mut self, yes: bool) -> Self {
        self.static_ordering = yes;
        self
    }

    pub fn with_subset_mode(mut self, mode: SubsetMode) -> Self {
        self.subset_mode = mode;
        self
    }
}

#[derive(Clone, Debug)]
pub struct PrepareReport {
    pub rows_loaded: usize,
    pub zero_rows_excluded: usize,
}

fn noop_sink(_: &str) {}

pub struct Engine {
    raw: Table,
    config: EngineConfig,
    table: Option<EncodedTable>,
    cancel: Arc<AtomicBool>,
    sink: Box<dyn Fn(&str) + Send + Sync>,
    registry: Registry,
}

impl Engine {
    pub fn new(raw: Table, config: EngineConfig) -> Self {
        Self {
            raw,
            config,
            table: None,
            cancel: Arc::new(AtomicBool::new(false)),
            sink: Box::new(noop_sink),
            registry: Registry::new(),
        }
    }

    pub fn set_progress_sink(&mut self, sink: impl Fn(&str) + Send + Sync + 'static) {
        self.sink = Box::new(sink);
    }

    /// A handle the caller can flip from another thread to stop the search
    /// early; already-discovered solutions remain available in `results()`.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn prepare(&mut self) -> Result<PrepareReport, EngineError> {
        if self.config.tolerance < 0.0 {
            return Err(EngineError::InvalidTolerance(format!(
                "tolerance must be >= 0, got {}",
                self.config.tolerance
            )));
        }
        let encoded = column_encoder::encode(&self.raw, &self.config.grouping_columns, &self.config.amount_column)?;
        (self.sink)(&format!("Loaded {} rows", self.raw.n_rows()));
        if encoded.zero_rows_excluded > 0 {
            (self.sink)(&format!(
                "Note: {} zero-amount row(s) excluded",
                encoded.zero_rows_excluded
            ));
        }
        let report = PrepareReport {
            rows_loaded: self.raw.n_rows(),
            zero_rows_excluded: encoded.zero_rows_excluded,
        };
        tracing::debug!(
            rows = report.rows_loaded,
            excluded = report.zero_rows_excluded,
            columns = ?self.config.grouping_columns,
            "engine prepared"
        );
        self.table = Some(encoded);
        Ok(report)
    }

    pub fn search(&mut self) {
        let table = self.table.as_ref().expect("call prepare() before search()");
        tracing::debug!(sum_target = self.config.target, tolerance = self.config.tolerance, "search starting");
        bfs::run(table, &self.config, self.cancel.as_ref(), &self.registry, self.sink.as_ref());
    }

    /// Final results, deduplicated one last time by canonical rule key
    /// (two branches can independently arrive at the same rule) and sorted
    /// by discovery order.
    pub fn results(&self) -> Vec<Solution> {
        let mut by_key: HashMap<RuleKey, Solution> = HashMap::new();
        for solution in self.registry.results() {
            by_key.entry(solution.rule.canonical_key()).or_insert(solution);
        }
        let mut out: Vec<Solution> = by_key.into_values().collect();
        out.sort_by_key(|s| s.id);
        out
    }

    pub fn kept_indices(&self) -> &[usize] {
        &self
            .table
            .as_ref()
            .expect("call prepare() before kept_indices()")
            .kept_indices
    }

    /// Per-row `solution_set` label, indexed by original (pre zero-amount
    /// filter) row position.
    pub fn solution_labels(&self) -> Vec<String> {
        let table = self.table.as_ref().expect("call prepare() before solution_labels()");
        attribution::row_labels(table, &self.results(), self.raw.n_rows())
    }

    pub(crate) fn encoded_table(&self) -> &EncodedTable {
        self.table.as_ref().expect("call prepare() before encoded_table()")
    }
}
