//! Brute-force flat index — exact k-NN over squared L2 distance

use rayon::prelude::*;

use crate::distance::squared_euclidean;
use crate::error::Result;
use crate::index::Index;
use crate::neighbor_queue::{Neighbor, TopK};
use crate::vector::Vector;
use crate::VectorId;

/// Below this many stored vectors a scan stays on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 4096;

/// A flat (brute-force) index that computes distance to every stored vector.
///
/// Vectors live in one row-major buffer; a vector's row number is its id.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create a new empty flat index for vectors of `dimension` components.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "flat index dimension must be non-zero");
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from a row-major buffer, e.g. one read from a snapshot.
    ///
    /// Returns `None` if `dimension` is zero or the buffer is not a whole number of rows.
    pub fn from_rows(dimension: usize, data: Vec<f32>) -> Option<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return None;
        }
        Some(Self { dimension, data })
    }

    /// Get a vector by id.
    pub fn get_vector(&self, id: VectorId) -> Option<&[f32]> {
        let start = usize::try_from(id).ok()?.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end)
    }

    /// Iterate over all (id, vector) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (VectorId, &[f32])> {
        self.data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, row)| (i as VectorId, row))
    }

    /// The raw row-major buffer.
    pub fn as_rows(&self) -> &[f32] {
        &self.data
    }

    /// Drop every vector whose id is `>= len`.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len * self.dimension);
    }

    fn scan(&self, query: &[f32], k: usize) -> TopK {
        if self.len() < PARALLEL_THRESHOLD {
            let mut top = TopK::new(k);
            for (id, row) in self.iter() {
                top.push(Neighbor::new(id, squared_euclidean(query, row)));
            }
            return top;
        }

        self.data
            .par_chunks_exact(self.dimension)
            .enumerate()
            .fold(
                || TopK::new(k),
                |mut top, (i, row)| {
                    top.push(Neighbor::new(i as VectorId, squared_euclidean(query, row)));
                    top
                },
            )
            .reduce(|| TopK::new(k), TopK::merge)
    }
}

impl Index for FlatIndex {
    fn add(&mut self, vector: Vector) -> Result<VectorId> {
        vector.check_dimension(self.dimension)?;
        let id = self.len() as VectorId;
        self.data.extend_from_slice(vector.as_slice());
        Ok(id)
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(VectorId, f32)>> {
        query.check_dimension(self.dimension)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .scan(query.as_slice(), k)
            .into_sorted_vec()
            .into_iter()
            .map(|n| (n.id, n.distance))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorStoreError;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_index_basic() {
        let mut index = FlatIndex::new(3);
        assert_eq!(index.add(Vector::new(vec![1.0, 0.0, 0.0])).unwrap(), 0);
        assert_eq!(index.add(Vector::new(vec![0.0, 1.0, 0.0])).unwrap(), 1);
        assert_eq!(index.add(Vector::new(vec![1.0, 1.0, 0.0])).unwrap(), 2);

        let query = Vector::new(vec![1.0, 0.0, 0.0]);
        let results = index.search(&query, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0); // exact match
        assert!(results[0].1 < 1e-6);
        assert_eq!(results[1].0, 2);
        assert_relative_eq!(results[1].1, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_squared_distances_and_ordering() {
        let mut index = FlatIndex::new(2);
        index.add(Vector::new(vec![0.0, 0.0])).unwrap();
        index.add(Vector::new(vec![10.0, 0.0])).unwrap();
        index.add(Vector::new(vec![0.0, 10.0])).unwrap();

        let results = index.search(&Vector::new(vec![1.0, 0.0]), 3).unwrap();
        assert_eq!(results, vec![(0, 1.0), (1, 81.0), (2, 101.0)]);
    }

    #[test]
    fn test_ties_broken_by_lower_id() {
        let mut index = FlatIndex::new(1);
        index.add(Vector::new(vec![2.0])).unwrap();
        index.add(Vector::new(vec![-2.0])).unwrap();
        index.add(Vector::new(vec![2.0])).unwrap();

        let results = index.search(&Vector::new(vec![0.0]), 2).unwrap();
        assert_eq!(results, vec![(0, 4.0), (1, 4.0)]);
    }

    #[test]
    fn test_fewer_than_k_and_empty() {
        let mut index = FlatIndex::new(2);
        let query = Vector::new(vec![0.0, 0.0]);
        assert!(index.search(&query, 5).unwrap().is_empty());

        index.add(Vector::new(vec![1.0, 1.0])).unwrap();
        assert_eq!(index.search(&query, 5).unwrap().len(), 1);
        assert!(index.search(&query, 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = FlatIndex::new(3);
        let result = index.add(Vector::new(vec![1.0, 2.0]));
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(index.len(), 0);

        assert!(index.search(&Vector::new(vec![1.0]), 1).is_err());
    }

    #[test]
    fn test_get_vector_and_truncate() {
        let mut index = FlatIndex::new(2);
        index.add(Vector::new(vec![1.0, 2.0])).unwrap();
        index.add(Vector::new(vec![3.0, 4.0])).unwrap();

        assert_eq!(index.get_vector(1), Some(&[3.0, 4.0][..]));
        assert_eq!(index.get_vector(2), None);

        index.truncate(1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get_vector(1), None);
        assert_eq!(index.add(Vector::new(vec![5.0, 6.0])).unwrap(), 1);
    }

    #[test]
    fn test_from_rows() {
        let index = FlatIndex::from_rows(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(index.len(), 2);
        assert!(FlatIndex::from_rows(2, vec![1.0, 2.0, 3.0]).is_none());
        assert!(FlatIndex::from_rows(0, vec![]).is_none());
    }

    #[test]
    fn test_parallel_scan_matches_sequential_order() {
        let dim = 4;
        let n = PARALLEL_THRESHOLD + 100;
        let mut index = FlatIndex::new(dim);
        for i in 0..n {
            // Every value repeats 10 times so ties are plentiful.
            let v = (i % (n / 10)) as f32;
            index.add(Vector::new(vec![v; dim])).unwrap();
        }

        let query = Vector::new(vec![3.0; dim]);
        let results = index.search(&query, 25).unwrap();
        assert_eq!(results.len(), 25);

        let mut expected: Vec<(VectorId, f32)> = index
            .iter()
            .map(|(id, row)| (id, squared_euclidean(query.as_slice(), row)))
            .collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        expected.truncate(25);
        assert_eq!(results, expected);
    }
}
