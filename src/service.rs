//! Index service: the single entry point for adding and searching vectors.
//!
//! The flat index, the text records and the degraded flag live together behind
//! one `RwLock`. `add` holds the write lock across mutation *and* snapshot
//! save, so a returned id is always on disk and concurrent adds can never be
//! handed the same id. `search` only takes the read lock.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{LoadError, Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::index::Index;
use crate::persistence::{IndexSnapshot, SnapshotManager};
use crate::records::VectorRecordStore;
use crate::vector::Vector;
use crate::VectorId;

/// A resolved search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: VectorId,
    pub text: String,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// Outcome of a search: ranked hits plus any ids whose text could not be found.
///
/// A non-empty `missing` list means the in-memory state is damaged; the hits
/// that did resolve are still valid and in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub missing: Vec<VectorId>,
}

impl SearchOutcome {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Point-in-time summary of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub vector_count: usize,
    pub dimension: usize,
    pub read_only: bool,
}

#[derive(Debug)]
struct IndexState {
    index: FlatIndex,
    records: VectorRecordStore,
    /// Set once the index and records can no longer be trusted to agree.
    read_only: bool,
}

/// Owns the index and its records, and keeps the snapshot on disk in step with them.
#[derive(Debug)]
pub struct IndexService {
    state: RwLock<IndexState>,
    snapshots: SnapshotManager,
    config: ServiceConfig,
}

impl IndexService {
    /// Restore the index from the configured snapshot, or start empty if there is none.
    ///
    /// A corrupt snapshot, or one with a different dimension than configured,
    /// is an error: the service refuses to start rather than drop data.
    pub fn open(config: ServiceConfig) -> Result<Self> {
        if config.dimension == 0 {
            return Err(VectorStoreError::InvalidConfig {
                reason: "dimension must be non-zero".to_string(),
            });
        }

        let snapshots = SnapshotManager::new(&config.snapshot_path);
        if let Err(e) = snapshots.clean_stale_temp() {
            tracing::warn!(path = ?snapshots.temp_path(), error = %e, "could not remove stale temp file");
        }

        let (index, records) = match snapshots.load()? {
            Some(snapshot) => {
                if snapshot.dimension as usize != config.dimension {
                    return Err(VectorStoreError::ConfigMismatch {
                        configured: config.dimension,
                        snapshot: snapshot.dimension as usize,
                    });
                }
                let (index, records) = snapshot
                    .into_parts()
                    .map_err(|reason| LoadError::corrupt(snapshots.path(), reason))?;
                tracing::info!(
                    path = ?snapshots.path(),
                    vectors = index.len(),
                    dimension = index.dimension(),
                    "restored index from snapshot"
                );
                (index, records)
            }
            None => {
                tracing::info!(
                    path = ?snapshots.path(),
                    dimension = config.dimension,
                    "no snapshot found, starting with an empty index"
                );
                (FlatIndex::new(config.dimension), VectorRecordStore::new())
            }
        };

        Ok(Self {
            state: RwLock::new(IndexState {
                index,
                records,
                read_only: false,
            }),
            snapshots,
            config,
        })
    }

    /// Store a vector with its source text and return the id assigned to it.
    ///
    /// The id is returned only after the new state has been written to disk.
    /// If the write fails the insert is undone and the id will be reused.
    /// Leading and trailing whitespace is stripped from `text` before it is stored.
    pub fn add(&self, vector: Vector, text: impl AsRef<str>) -> Result<VectorId> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(VectorStoreError::InvalidText {
                reason: "text is empty".to_string(),
            });
        }
        vector.check_dimension(self.config.dimension)?;
        vector.check_finite()?;

        let mut state = self.write()?;
        if state.read_only {
            return Err(VectorStoreError::ReadOnly);
        }

        let id = state.index.add(vector)?;
        let previous_len = id as usize;

        if let Err(e) = state.records.put(id, text) {
            // A record already exists for an id that had no vector.
            state.index.truncate(previous_len);
            state.read_only = true;
            tracing::error!(id, error = %e, "record store out of step with index, switching to read-only");
            return Err(e);
        }

        let snapshot = IndexSnapshot::capture(&state.index, &state.records);
        if let Err(e) = self.snapshots.save(&snapshot) {
            state.index.truncate(previous_len);
            state.records.remove(id);
            tracing::error!(id, error = %e, "snapshot save failed, insert rolled back");
            return Err(e);
        }

        tracing::debug!(id, vectors = state.index.len(), "vector added");
        Ok(id)
    }

    /// Find the `k` stored vectors closest to `query`, with their texts.
    pub fn search(&self, query: &Vector, k: usize) -> Result<SearchOutcome> {
        query.check_dimension(self.config.dimension)?;
        query.check_finite()?;

        let state = self.read()?;
        let ranked = state.index.search(query, k)?;

        let mut outcome = SearchOutcome::default();
        for (id, distance) in ranked {
            match state.records.get(id) {
                Some(text) => outcome.hits.push(SearchHit {
                    id,
                    text: text.to_string(),
                    distance,
                }),
                None => {
                    tracing::warn!(id, "search hit has no text record");
                    outcome.missing.push(id);
                }
            }
        }

        tracing::debug!(k, hits = outcome.hits.len(), missing = outcome.missing.len(), "search done");
        Ok(outcome)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.index.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Whether writes have been disabled after an internal inconsistency.
    pub fn is_read_only(&self) -> Result<bool> {
        Ok(self.read()?.read_only)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let state = self.read()?;
        Ok(IndexStats {
            vector_count: state.index.len(),
            dimension: state.index.dimension(),
            read_only: state.read_only,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshots.path()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>> {
        self.state.read().map_err(|_| VectorStoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>> {
        self.state.write().map_err(|_| VectorStoreError::LockPoisoned)
    }
}
