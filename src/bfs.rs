//! C5 — Level-synchronous parallel BFS driver.
//!
//! Every node at the current level is expanded concurrently via `rayon`;
//! the next level is assembled from all children, then sorted by canonical
//! rule key so that iteration order (and therefore solution discovery
//! order) doesn't depend on the scheduler's thread interleaving.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use indicatif::ParallelProgressIterator;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use crate::bitset::RowMask;
use crate::column_encoder::EncodedTable;
use crate::engine::EngineConfig;
use crate::registry::Registry;
use crate::rule::{Rule, RuleKey};
use crate::state::{process_state, SearchState};

pub(crate) fn run(
    table: &EncodedTable,
    config: &EngineConfig,
    cancel: &AtomicBool,
    registry: &Registry,
    sink: &(dyn Fn(&str) + Send + Sync),
) {
    let memo: Mutex<HashSet<RuleKey>> = Mutex::new(HashSet::new());

    let mut level = vec![SearchState {
        rule: Rule::empty(),
        mask: RowMask::ones(table.n_rows()),
        sum: table.total_sum(),
    }];
    let mut depth = 0usize;

    while !level.is_empty() {
        debug!(depth, states = level.len(), "expanding BFS level");
        let mut next: Vec<SearchState> = level
            .par_iter()
            .progress_count(level.len() as u64)
            .flat_map(|s| process_state(s, table, config, &memo, registry, cancel, sink))
            .collect();

        next.sort_by(|a, b| a.rule.canonical_key().cmp(&b.rule.canonical_key()));
        level = next;
        depth += 1;
    }
}
