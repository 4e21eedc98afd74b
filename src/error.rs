//! Error types for the vector store

use std::path::PathBuf;
use thiserror::Error;

use crate::VectorId;

/// Result type alias for vector store operations
pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Error types that can occur in vector store operations
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("Invalid text: {reason}")]
    InvalidText { reason: String },

    #[error("Duplicate record id: {id}")]
    DuplicateId { id: VectorId },

    #[error("Failed to persist snapshot to {path:?}: {source}")]
    PersistError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index is read-only after an unrecoverable write failure")]
    ReadOnly,

    #[error("Snapshot dimension {snapshot} does not match configured dimension {configured}")]
    ConfigMismatch { configured: usize, snapshot: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Index lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while reading a snapshot at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
