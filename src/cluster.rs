//! C7 — Union-Find cluster assignment for recon mode.
//!
//! Record-linkage output is a table of candidate match pairs; rows joined,
//! directly or transitively, belong to the same cluster. Cluster ids are
//! assigned densely in first-seen-root order so output is reproducible
//! across runs on the same input.

use std::collections::HashMap;

use crate::table::Table;

pub(crate) struct UnionFind {
    parent: HashMap<String, String>,
    /// First-seen insertion order. `HashMap` iteration order is not stable,
    /// so cluster id assignment walks this instead.
    order: Vec<String>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn ensure(&mut self, x: &str) {
        if !self.parent.contains_key(x) {
            self.parent.insert(x.to_string(), x.to_string());
            self.order.push(x.to_string());
        }
    }

    pub fn find(&mut self, x: &str) -> String {
        let mut curr = x.to_string();
        loop {
            let p = self.parent.get(&curr).cloned().unwrap_or_else(|| curr.clone());
            if p == curr {
                return curr;
            }
            // path halving
            let gp = self.parent.get(&p).cloned().unwrap_or_else(|| p.clone());
            self.parent.insert(curr.clone(), gp.clone());
            curr = gp;
        }
    }

    pub fn union(&mut self, a: &str, b: &str) {
        self.ensure(a);
        self.ensure(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

fn pick_id_columns(pairs: &Table) -> (usize, usize) {
    if let (Some(l), Some(r)) = (pairs.column_index("unique_id_l"), pairs.column_index("unique_id_r")) {
        return (l, r);
    }
    (0, 1)
}

/// Builds `unique_id -> cluster_id` from a table of candidate match pairs.
/// Cluster ids start at 0 and are assigned in the order each root is first
/// observed while walking the union-find's insertion history.
pub(crate) fn clusters_from_pairs(pairs: &Table) -> HashMap<String, u64> {
    let (li, ri) = pick_id_columns(pairs);
    let mut uf = UnionFind::new();
    for row in 0..pairs.n_rows() {
        let (Some(l), Some(r)) = (pairs.cell(row, li), pairs.cell(row, ri)) else {
            tracing::debug!(row, "pair row missing an id, skipping for union-find");
            continue;
        };
        uf.union(l, r);
    }

    let mut root_to_id: HashMap<String, u64> = HashMap::new();
    let mut out = HashMap::new();
    let ids: Vec<String> = uf.order.clone();
    for id in ids {
        let root = uf.find(&id);
        let next_id = root_to_id.len() as u64;
        let cluster_id = *root_to_id.entry(root).or_insert(next_id);
        out.insert(id, cluster_id);
    }
    out
}
