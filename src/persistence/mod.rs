//! Persistence layer: snapshot format and atomic snapshot files.

pub mod serialization;
pub mod snapshot;

pub use serialization::{IndexSnapshot, SnapshotManifest};
pub use snapshot::SnapshotManager;
