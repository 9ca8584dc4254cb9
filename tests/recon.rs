//! Integration tests for the per-cluster recon wrapper: Union-Find cluster
//! assignment over record-linkage pair output, followed by one zero-target
//! engine invocation per cluster.

use zerosum::{run_recon, ReconConfig, Table};

fn pairs(rows: &[(&str, &str)]) -> Table {
    let rows = rows
        .iter()
        .map(|(l, r)| vec![Some(l.to_string()), Some(r.to_string())])
        .collect();
    Table::new(vec!["unique_id_l".into(), "unique_id_r".into()], rows)
}

fn combined(rows: &[(&str, f64, &str)]) -> Table {
    let rows = rows
        .iter()
        .map(|(id, amt, vendor)| vec![Some(id.to_string()), Some(amt.to_string()), Some(vendor.to_string())])
        .collect();
    Table::new(vec!["unique_id".into(), "amount".into(), "vendor".into()], rows)
}

/// S5 — two clusters {a,b,c} and {d,e} from pairs (a,b),(b,c),(d,e).
#[test]
fn s5_union_find_clusters_records_transitively() {
    let p = pairs(&[("a", "b"), ("b", "c"), ("d", "e")]);
    let c = combined(&[
        ("a", 1.0, "v1"),
        ("b", -1.0, "v1"),
        ("c", 5.0, "v2"),
        ("d", 2.0, "v3"),
        ("e", -2.0, "v3"),
    ]);
    let config = ReconConfig {
        amount_column: "amount".to_string(),
        tolerance: 0.01,
        mapped_columns: vec![],
    };
    let sink = |_: &str| {};
    let outcome = run_recon(&p, &c, "unique_id", &config, &sink).unwrap();

    // a, b, c share a cluster id; d, e share a different one.
    assert_eq!(outcome.cluster_ids[0], outcome.cluster_ids[1]);
    assert_eq!(outcome.cluster_ids[1], outcome.cluster_ids[2]);
    assert_eq!(outcome.cluster_ids[3], outcome.cluster_ids[4]);
    assert_ne!(outcome.cluster_ids[0], outcome.cluster_ids[3]);
}

#[test]
fn recon_finds_zero_sum_group_within_a_cluster() {
    let p = pairs(&[("a", "b"), ("b", "c")]);
    let c = combined(&[("a", 10.0, "v1"), ("b", -10.0, "v1"), ("c", 999.0, "v2")]);
    let config = ReconConfig {
        amount_column: "amount".to_string(),
        tolerance: 0.01,
        mapped_columns: vec![],
    };
    let sink = |_: &str| {};
    let outcome = run_recon(&p, &c, "unique_id", &config, &sink).unwrap();

    assert_eq!(outcome.clusters_found, 1);
    assert_eq!(outcome.groups_found, 1);
    assert!(!outcome.recon_groups[0].is_empty());
    assert_eq!(outcome.recon_groups[0], outcome.recon_groups[1]);
    assert!(outcome.failed_clusters.is_empty());
}

#[test]
fn rows_not_participating_in_any_pair_get_no_cluster() {
    let p = pairs(&[("a", "b")]);
    let c = combined(&[("a", 1.0, "v1"), ("b", -1.0, "v1"), ("z", 3.0, "v9")]);
    let config = ReconConfig {
        amount_column: "amount".to_string(),
        tolerance: 0.01,
        mapped_columns: vec![],
    };
    let sink = |_: &str| {};
    let outcome = run_recon(&p, &c, "unique_id", &config, &sink).unwrap();

    // "z" never appears in `pairs`, so it's dropped from the result entirely
    // rather than kept with an empty cluster id.
    assert_eq!(outcome.kept_rows, vec![0, 1]);
    assert_eq!(outcome.cluster_ids.len(), 2);
    assert_eq!(outcome.recon_groups.len(), 2);
}

#[test]
fn clusters_of_size_one_are_skipped() {
    // "c" appears alone in the pairs table is impossible (pairs always have
    // two ids), but a cluster can still resolve to a single combined row if
    // the other id never appears in `combined`.
    let p = pairs(&[("a", "ghost")]);
    let c = combined(&[("a", 1.0, "v1")]);
    let config = ReconConfig {
        amount_column: "amount".to_string(),
        tolerance: 0.01,
        mapped_columns: vec![],
    };
    let sink = |_: &str| {};
    let outcome = run_recon(&p, &c, "unique_id", &config, &sink).unwrap();
    assert_eq!(outcome.clusters_found, 0);
    assert_eq!(outcome.groups_found, 0);
}
