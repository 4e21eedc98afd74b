//! Index trait for pluggable search backends

use crate::error::Result;
use crate::vector::Vector;
use crate::VectorId;

/// A nearest-neighbor index that assigns ids on insertion.
///
/// Ids are handed out densely from zero in insertion order. `search` returns
/// `(id, distance)` pairs sorted ascending by distance; exact backends break
/// ties by lower id, approximate ones only try to.
pub trait Index {
    /// Append a vector and return its newly assigned id.
    fn add(&mut self, vector: Vector) -> Result<VectorId>;

    /// Search for the `k` nearest neighbors of `query`.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(VectorId, f32)>>;

    /// The fixed vector dimension of this index.
    fn dimension(&self) -> usize;

    /// The number of vectors in this index.
    fn len(&self) -> usize;

    /// Whether the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
