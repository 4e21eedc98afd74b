//! # vector_store
//!
//! A persistent, exact nearest-neighbor store for text embeddings.
//!
//! Vectors of a fixed dimension are appended to a flat index and receive
//! dense ids starting at zero. Each id is paired with the text it was embedded
//! from. Every insert rewrites a checksummed snapshot file atomically, so a
//! restart restores exactly what was acknowledged.
//!
//! This library provides:
//! - A brute-force flat index over squared L2 distance
//! - An id → text record store
//! - Atomic, checksummed snapshot persistence
//! - [`IndexService`], which ties them together behind a read-write lock
//! - A thin HTTP API (`server`)
//!
//! ## Example
//!
//! ```rust
//! use vector_store::{IndexService, ServiceConfig, Vector};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let service = IndexService::open(ServiceConfig::new(2, dir.path().join("index.snapshot"))).unwrap();
//!
//! let id = service.add(Vector::new(vec![0.0, 0.0]), "origin").unwrap();
//! assert_eq!(id, 0);
//!
//! let outcome = service.search(&Vector::new(vec![1.0, 0.0]), 5).unwrap();
//! assert_eq!(outcome.hits[0].text, "origin");
//! assert_eq!(outcome.hits[0].distance, 1.0);
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod flat_index;
pub mod index;
pub mod metrics;
pub mod neighbor_queue;
pub mod persistence;
pub mod records;
pub mod server;
pub mod service;
pub mod vector;

/// Identifier assigned to a vector on insertion; equal to its insertion position.
pub type VectorId = u64;

pub use config::ServiceConfig;
pub use error::{LoadError, Result, VectorStoreError};
pub use flat_index::FlatIndex;
pub use index::Index;
pub use persistence::{IndexSnapshot, SnapshotManager};
pub use records::VectorRecordStore;
pub use service::{IndexService, IndexStats, SearchHit, SearchOutcome};
pub use vector::Vector;
