//! C8 — Row attribution.
//!
//! Maps a rule back to the row mask it selects, and builds the per-row
//! `solution_set` label column: a row may be claimed by more than one
//! solution, so labels are joined with `_` in ascending solution-id order.

use std::collections::BTreeSet;

use crate::bitset::RowMask;
use crate::column_encoder::EncodedTable;
use crate::registry::Solution;

pub(crate) fn solution_mask(table: &EncodedTable, solution: &crate::rule::Rule) -> RowMask {
    let n = table.n_rows();
    let mut mask = RowMask::ones(n);
    for (col, cats) in solution.entries() {
        let column = &table.columns[*col];
        let col_mask = RowMask::union(n, cats.iter().map(|&c| &column.masks[c as usize]));
        mask.and_assign(&col_mask);
    }
    mask
}

/// Builds one label per row of the *original* (pre zero-amount-filter)
/// table: `solution_set` values for rows untouched by any solution are
/// empty strings.
pub(crate) fn row_labels(table: &EncodedTable, solutions: &[Solution], original_row_count: usize) -> Vec<String> {
    let mut per_row: Vec<BTreeSet<u64>> = vec![BTreeSet::new(); original_row_count];
    for solution in solutions {
        let mask = solution_mask(table, &solution.rule);
        for post_idx in mask.iter_ones() {
            let orig_idx = table.kept_indices[post_idx];
            per_row[orig_idx].insert(solution.id);
        }
    }
    per_row
        .into_iter()
        .map(|ids| {
            ids.into_iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("_")
        })
        .collect()
}
