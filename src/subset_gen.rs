//! C3 — Subset Generator.
//!
//! For a chosen column and the categories still available under the parent
//! mask, produces `(subset, mask, sum)` triples to branch on. Both modes
//! also emit the complement ("mirror") of a candidate as a fast path for
//! symmetric splits, whenever the mirror's sum alone matches the target.
//!
//! This generates its full candidate sequence up front rather than as a true
//! coroutine (see DESIGN.md) — category domains are small relative to row
//! counts, so the memory cost is negligible, and the result is still handed
//! back as a plain iterator that a caller polls and can abandon early on
//! cancellation.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;

use crate::bitset::RowMask;
use crate::bounds;
use crate::column_encoder::EncodedTable;
use crate::engine::SubsetMode;
use crate::rule::CatId;

pub(crate) struct Candidate {
    pub subset: BTreeSet<CatId>,
    pub mask: RowMask,
    pub sum: f64,
}

fn union_mask(table: &EncodedTable, col: usize, cats: &BTreeSet<CatId>, parent_mask: &RowMask) -> RowMask {
    let column = &table.columns[col];
    let mut m = RowMask::zeros(parent_mask.len());
    for &c in cats {
        m.or_assign(&column.masks[c as usize]);
    }
    m.and_assign(parent_mask);
    m
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn generate(
    mode: SubsetMode,
    table: &EncodedTable,
    col: usize,
    avail: &BTreeSet<CatId>,
    parent_mask: &RowMask,
    target: f64,
    tol: f64,
    cancel: &AtomicBool,
) -> Vec<Candidate> {
    match mode {
        SubsetMode::Original => generate_original(table, col, avail, parent_mask, target, tol, cancel),
        SubsetMode::New => generate_new(table, col, avail, parent_mask, target, tol, cancel),
    }
}

#[allow(clippy::too_many_arguments)]
fn generate_original(
    table: &EncodedTable,
    col: usize,
    avail: &BTreeSet<CatId>,
    parent_mask: &RowMask,
    target: f64,
    tol: f64,
    cancel: &AtomicBool,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let global_total = bounds::mask_sum(table, parent_mask);

    let full = avail.clone();
    let full_mask = union_mask(table, col, &full, parent_mask);
    let full_sum = bounds::mask_sum(table, &full_mask);
    if bounds::is_viable(table, &full_mask, full_sum, target, tol) {
        out.push(Candidate {
            subset: full.clone(),
            mask: full_mask,
            sum: full_sum,
        });
    }
    // The mirror of the full set is empty, so there's nothing to yield here —
    // the interesting mirrors appear once `rec` starts removing elements.

    rec(
        table,
        col,
        avail,
        parent_mask,
        target,
        tol,
        cancel,
        global_total,
        &full,
        0,
        &mut out,
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn rec(
    table: &EncodedTable,
    col: usize,
    avail: &BTreeSet<CatId>,
    parent_mask: &RowMask,
    target: f64,
    tol: f64,
    cancel: &AtomicBool,
    global_total: f64,
    curr: &BTreeSet<CatId>,
    start: usize,
    out: &mut Vec<Candidate>,
) {
    if cancel.load(Ordering::Relaxed) {
        return;
    }
    let sorted_curr: Vec<CatId> = curr.iter().cloned().collect();
    for i in start..sorted_curr.len() {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let mut nc = curr.clone();
        nc.remove(&sorted_curr[i]);
        if nc.is_empty() {
            continue;
        }

        let nm = union_mask(table, col, &nc, parent_mask);
        let ns = bounds::mask_sum(table, &nm);

        // Non-viable subsets are skipped but their children are still
        // visited: removing further rows can restore viability.
        if bounds::is_viable(table, &nm, ns, target, tol) {
            out.push(Candidate {
                subset: nc.clone(),
                mask: nm,
                sum: ns,
            });
        }

        let mirror: BTreeSet<CatId> = avail.difference(&nc).cloned().collect();
        let mirror_sum = global_total - ns;
        if !mirror.is_empty() && bounds::matches_target(mirror_sum, target, tol) {
            out.push(Candidate {
                subset: mirror.clone(),
                mask: union_mask(table, col, &mirror, parent_mask),
                sum: mirror_sum,
            });
        }

        rec(
            table,
            col,
            avail,
            parent_mask,
            target,
            tol,
            cancel,
            global_total,
            &nc,
            i,
            out,
        );
    }
}

/// Enumerates non-empty subsets from largest cardinality down to 1, skipping
/// any subset that is a subset of an already-pruned set. This dominance
/// check is a heuristic, not a proven relation — it is an opt-in mode.
#[allow(clippy::too_many_arguments)]
fn generate_new(
    table: &EncodedTable,
    col: usize,
    avail: &BTreeSet<CatId>,
    parent_mask: &RowMask,
    target: f64,
    tol: f64,
    cancel: &AtomicBool,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let global_total = bounds::mask_sum(table, parent_mask);
    let avail_list: Vec<CatId> = avail.iter().cloned().collect();
    let mut pruned: Vec<BTreeSet<CatId>> = Vec::new();

    'sizes: for r in (1..=avail_list.len()).rev() {
        for comb in avail_list.iter().cloned().combinations(r) {
            if cancel.load(Ordering::Relaxed) {
                break 'sizes;
            }
            let candidate: BTreeSet<CatId> = comb.into_iter().collect();
            if pruned.iter().any(|p| candidate.is_subset(p)) {
                continue;
            }

            let nm = union_mask(table, col, &candidate, parent_mask);
            let ns = bounds::mask_sum(table, &nm);

            if ns < target {
                if bounds::positive_sum(table, &nm) < target - tol {
                    pruned.push(candidate);
                    continue;
                }
            } else if ns > target && bounds::negative_sum(table, &nm) > target + tol {
                pruned.push(candidate);
                continue;
            }

            out.push(Candidate {
                subset: candidate.clone(),
                mask: nm,
                sum: ns,
            });

            let mirror: BTreeSet<CatId> = avail.difference(&candidate).cloned().collect();
            let mirror_sum = global_total - ns;
            if !mirror.is_empty() && bounds::matches_target(mirror_sum, target, tol) {
                out.push(Candidate {
                    subset: mirror.clone(),
                    mask: union_mask(table, col, &mirror, parent_mask),
                    sum: mirror_sum,
                });
            }
        }
    }
    out
}
