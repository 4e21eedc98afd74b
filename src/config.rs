//! Service configuration.

use std::path::PathBuf;

/// Dimension produced by MiniLM-L6-v2, the embedding model the store was built around.
pub const DEFAULT_DIMENSION: usize = 384;

/// Number of results returned when a search does not ask for a specific `k`.
pub const DEFAULT_K: usize = 5;

/// Configuration for an [`IndexService`](crate::service::IndexService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Fixed vector dimension for a fresh index; must match any existing snapshot.
    pub dimension: usize,
    /// Location of the snapshot file.
    pub snapshot_path: PathBuf,
    /// `k` used by callers that do not specify one.
    pub default_k: usize,
}

impl ServiceConfig {
    pub fn new(dimension: usize, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            snapshot_path: snapshot_path.into(),
            ..Self::default()
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            snapshot_path: PathBuf::from("data/index.snapshot"),
            default_k: DEFAULT_K,
        }
    }
}
