//! C4 — State transition.
//!
//! Expands a single search node (a partial rule plus its row mask and sum)
//! into the next level's children, per spec: mirror dedup, bound pruning,
//! completion check, then branch on the remaining column with the fewest
//! observed categories.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::bitset::RowMask;
use crate::bounds;
use crate::column_encoder::EncodedTable;
use crate::engine::EngineConfig;
use crate::registry::Registry;
use crate::rule::{CatId, ColIdx, Rule, RuleKey};
use crate::subset_gen;

#[derive(Clone)]
pub(crate) struct SearchState {
    pub rule: Rule,
    pub mask: RowMask,
    pub sum: f64,
}

fn observed_categories(table: &EncodedTable, mask: &RowMask, col: ColIdx) -> BTreeSet<CatId> {
    let column = &table.columns[col];
    (0..column.cats.len() as CatId)
        .filter(|&c| !column.masks[c as usize].and(mask).is_empty())
        .collect()
}

fn choose_next_column(state: &SearchState, table: &EncodedTable, config: &EngineConfig) -> Option<ColIdx> {
    let candidates: Vec<(ColIdx, usize)> = (0..table.columns.len())
        .filter(|c| !state.rule.contains_col(*c))
        .map(|c| (c, observed_categories(table, &state.mask, c).len()))
        .filter(|(_, n)| *n >= 2)
        .collect();

    if candidates.is_empty() {
        return None;
    }
    if config.static_ordering {
        return candidates.first().map(|(c, _)| *c);
    }
    // Ties broken by declared (ascending) column order: `min_by_key` returns
    // the first of equally-minimal elements, and `candidates` is already in
    // ascending column order.
    candidates.iter().min_by_key(|(_, n)| *n).map(|(c, _)| *c)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn process_state(
    state: &SearchState,
    table: &EncodedTable,
    config: &EngineConfig,
    memo: &Mutex<HashSet<RuleKey>>,
    registry: &Registry,
    cancel: &AtomicBool,
    sink: &(dyn Fn(&str) + Send + Sync),
) -> Vec<SearchState> {
    if cancel.load(Ordering::Relaxed) {
        return Vec::new();
    }

    if !state.rule.is_empty() {
        let domains = table.domains();
        let key = state.rule.canonical_key();
        let mirror_rule = state.rule.mirror(&domains);
        let mirror_key = mirror_rule.canonical_key();

        let is_new = {
            let mut seen = memo.lock();
            let is_new = seen.insert(key.clone());
            if is_new && key != mirror_key {
                seen.insert(mirror_key);
            }
            is_new
        };

        if bounds::matches_target(state.sum, config.target, config.tolerance) {
            let completed = state.rule.completed(table, &state.mask);
            registry.register(&completed, &state.mask, state.sum, config.tolerance, sink);
        }

        if !is_new {
            // Either genuinely revisited, or this exact rule was only ever
            // reached here via a sibling's preemptive mirror insert: either
            // way its children are already covered by that sibling's own
            // branch-and-mirror pair.
            return Vec::new();
        }

        if !bounds::is_viable(table, &state.mask, state.sum, config.target, config.tolerance) {
            return Vec::new();
        }

        if state.rule.len() == table.columns.len() {
            return Vec::new();
        }
    } else if bounds::matches_target(state.sum, config.target, config.tolerance) {
        // The root itself (empty rule, every row selected) matches target.
        // Nothing above registers this case: the root has no parent to have
        // checked it, and it may have no branchable column at all (every
        // grouping column could have fewer than 2 observed categories),
        // in which case `choose_next_column` below would return `None` and
        // this match would otherwise go unreported.
        let completed = state.rule.completed(table, &state.mask);
        registry.register(&completed, &state.mask, state.sum, config.tolerance, sink);
    }

    let Some(next_col) = choose_next_column(state, table, config) else {
        return Vec::new();
    };
    let avail = observed_categories(table, &state.mask, next_col);

    let candidates = subset_gen::generate(
        config.subset_mode,
        table,
        next_col,
        &avail,
        &state.mask,
        config.target,
        config.tolerance,
        cancel,
    );

    let mut children = Vec::with_capacity(candidates.len());
    for c in candidates {
        if bounds::matches_target(c.sum, config.target, config.tolerance) {
            let child_rule = state.rule.pushed(next_col, c.subset.clone());
            let completed = child_rule.completed(table, &c.mask);
            registry.register(&completed, &c.mask, c.sum, config.tolerance, sink);
        }
        children.push(SearchState {
            rule: state.rule.pushed(next_col, c.subset),
            mask: c.mask,
            sum: c.sum,
        });
    }
    children
}
