use thiserror::Error;

/// Configuration errors fail a request before any search work starts.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("amount column '{0}' is not numeric")]
    NonNumericAmount(String),

    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),
}

/// A single cluster's search failed during recon mode. Carries the cluster
/// id alongside the underlying `EngineError` so callers can log and skip it
/// without aborting the rest of the run (spec §7: "caught per cluster,
/// logged via the progress sink ... and the cluster is skipped").
#[derive(Debug, Error)]
#[error("cluster {cluster_id}: {source}")]
pub struct ClusterError {
    pub cluster_id: u64,
    #[source]
    pub source: EngineError,
}
