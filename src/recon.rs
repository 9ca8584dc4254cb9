//! Per-cluster reconciliation: groups record-linkage output into clusters,
//! then runs a target-zero search inside each cluster independently.

use std::collections::{BTreeSet, HashMap};

use crate::attribution;
use crate::cluster::clusters_from_pairs;
use crate::engine::{Engine, EngineConfig};
use crate::error::{ClusterError, EngineError};
use crate::table::Table;

/// Columns a recon run never treats as a grouping column, even if present
/// in the combined table.
const RESERVED_COLUMNS: [&str; 4] = ["amount", "unique_id", "source_dataset", "cluster_id"];

#[derive(Clone, Debug)]
pub struct ReconConfig {
    pub amount_column: String,
    pub tolerance: f64,
    /// Caller-supplied grouping columns. If none of these exist on the
    /// combined table (or the list is empty), every non-reserved column is
    /// used instead.
    pub mapped_columns: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ReconOutcome {
    /// Original `combined`-table row indices that matched into a cluster, in
    /// ascending order. Rows whose unique id never appeared in `pairs` are
    /// dropped from the result entirely (mirroring the original's
    /// `dropna(subset=["cluster_id"])`), so `kept_rows`, `cluster_ids` and
    /// `recon_groups` are all the same length and line up positionally —
    /// `combined.subset_rows(&kept_rows)` reconstructs the matching table.
    pub kept_rows: Vec<usize>,
    /// One `cluster_id` per `kept_rows` entry.
    pub cluster_ids: Vec<String>,
    /// One `recon_group` label per `kept_rows` entry, underscore-joined
    /// when a row is claimed by more than one solution.
    pub recon_groups: Vec<String>,
    pub clusters_found: usize,
    pub groups_found: usize,
    /// Clusters whose engine invocation errored out (e.g. a non-numeric
    /// amount cell reached only in that cluster's subset). Other clusters
    /// still ran to completion.
    pub failed_clusters: Vec<ClusterError>,
}

fn resolve_grouping_columns(combined: &Table, mapped: &[String], amount_column: &str) -> Vec<String> {
    let existing: Vec<String> = mapped
        .iter()
        .filter(|c| c.as_str() != amount_column && combined.column_index(c).is_some())
        .cloned()
        .collect();
    if !existing.is_empty() {
        return existing;
    }
    combined
        .header()
        .iter()
        .filter(|c| c.as_str() != amount_column && !RESERVED_COLUMNS.contains(&c.as_str()))
        .cloned()
        .collect()
}

fn merge_label(existing: &mut String, new_label: &str) {
    let mut ids: BTreeSet<u64> = existing
        .split('_')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if let Ok(n) = new_label.parse::<u64>() {
        ids.insert(n);
    }
    *existing = ids.into_iter().map(|n| n.to_string()).collect::<Vec<_>>().join("_");
}

pub fn run_recon(
    pairs: &Table,
    combined: &Table,
    unique_id_column: &str,
    config: &ReconConfig,
    sink: &(dyn Fn(&str) + Send + Sync),
) -> Result<ReconOutcome, EngineError> {
    let id_col = combined
        .column_index(unique_id_column)
        .ok_or_else(|| EngineError::MissingColumn(unique_id_column.to_string()))?;

    let clusters = clusters_from_pairs(pairs);

    let mut rows_by_cluster: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut row_cluster: Vec<Option<u64>> = vec![None; combined.n_rows()];
    for row in 0..combined.n_rows() {
        if let Some(uid) = combined.cell(row, id_col) {
            if let Some(&cid) = clusters.get(uid) {
                rows_by_cluster.entry(cid).or_default().push(row);
                row_cluster[row] = Some(cid);
            }
        }
    }

    let grouping_columns = resolve_grouping_columns(combined, &config.mapped_columns, &config.amount_column);

    let mut recon_groups = vec![String::new(); combined.n_rows()];
    let mut group_counter: u64 = 0;
    let mut clusters_found = 0usize;
    let mut failed_clusters = Vec::new();

    let mut cluster_ids_sorted: Vec<u64> = rows_by_cluster.keys().cloned().collect();
    cluster_ids_sorted.sort_unstable();

    for cid in cluster_ids_sorted {
        let rows = &rows_by_cluster[&cid];
        if rows.len() < 2 {
            continue;
        }
        clusters_found += 1;

        let sub = combined.subset_rows(rows);
        let mut engine = Engine::new(
            sub,
            EngineConfig::new(grouping_columns.clone(), config.amount_column.clone(), 0.0, config.tolerance),
        );
        if let Err(e) = engine.prepare() {
            sink(&format!("  \u{26A0} Cluster {cid}: {e}"));
            tracing::warn!(cluster_id = cid, error = %e, "cluster search failed, skipping");
            failed_clusters.push(ClusterError {
                cluster_id: cid,
                source: e,
            });
            continue;
        }
        engine.search();
        let solutions = engine.results();
        sink(&format!("Cluster {cid}: {} zero-sum group(s) found.", solutions.len()));
        if solutions.is_empty() {
            continue;
        }

        let kept = engine.kept_indices().to_vec();
        for solution in &solutions {
            group_counter += 1;
            let label = group_counter.to_string();
            let mask = attribution::solution_mask(engine.encoded_table(), &solution.rule);
            for post_idx in mask.iter_ones() {
                let sub_idx = kept[post_idx];
                let orig_row = rows[sub_idx];
                merge_label(&mut recon_groups[orig_row], &label);
            }
        }
    }

    sink(&format!(
        "AutoRecon complete — {group_counter} groups, {} rows.",
        combined.n_rows()
    ));

    let kept_rows: Vec<usize> = (0..combined.n_rows()).filter(|&r| row_cluster[r].is_some()).collect();
    let cluster_ids = kept_rows
        .iter()
        .map(|&r| row_cluster[r].expect("filtered to rows with a cluster").to_string())
        .collect();
    let recon_groups = kept_rows.iter().map(|&r| recon_groups[r].clone()).collect();

    Ok(ReconOutcome {
        kept_rows,
        cluster_ids,
        recon_groups,
        clusters_found,
        groups_found: group_counter as usize,
        failed_clusters,
    })
}
