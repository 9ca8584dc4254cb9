//! C6 — Solution Registry.
//!
//! Tracks every distinct row-set solution found across the search, assigning
//! ascending ids in discovery order and rejecting duplicates by the set of
//! row indices they cover (two different rules can select the same rows).

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

use crate::bitset::RowMask;
use crate::rule::Rule;

#[derive(Clone, Debug)]
pub struct Solution {
    pub id: u64,
    pub rule: Rule,
    pub sum: f64,
}

struct Inner {
    by_fingerprint: HashMap<Vec<usize>, u64>,
    results: Vec<Solution>,
    counter: u64,
}

pub(crate) struct Registry {
    start: Instant,
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            inner: Mutex::new(Inner {
                by_fingerprint: HashMap::new(),
                results: Vec::new(),
                counter: 0,
            }),
        }
    }

    /// Registers a solution if its row set hasn't been seen before. Returns
    /// `true` when this call actually added a new solution.
    pub fn register(
        &self,
        rule: &Rule,
        mask: &RowMask,
        sum: f64,
        tol: f64,
        sink: &(dyn Fn(&str) + Send + Sync),
    ) -> bool {
        let fingerprint: Vec<usize> = mask.iter_ones().collect();
        let mut inner = self.inner.lock();
        if inner.by_fingerprint.contains_key(&fingerprint) {
            return false;
        }
        inner.counter += 1;
        let id = inner.counter;
        inner.by_fingerprint.insert(fingerprint, id);
        inner.results.push(Solution {
            id,
            rule: rule.clone(),
            sum,
        });

        let dp = decimal_places(tol);
        let elapsed = self.start.elapsed().as_secs_f64();
        sink(&format!(
            "[{elapsed:.2}s] Solution {id} found: Sum Amount: {sum:.dp$}",
            elapsed = elapsed,
            id = id,
            sum = sum,
            dp = dp
        ));
        true
    }

    pub fn results(&self) -> Vec<Solution> {
        self.inner.lock().results.clone()
    }
}

/// How many decimal places to report sums at, derived from the tolerance in
/// use. A tolerance of `0.01` reports two places; tighter tolerances report
/// proportionally more, never fewer than two.
pub(crate) fn decimal_places(tol: f64) -> usize {
    if tol <= 0.0 {
        return 2;
    }
    (-tol.log10().floor() as i64).max(2) as usize
}
