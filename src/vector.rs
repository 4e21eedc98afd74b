//! Vector type and input validation

use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An embedding: a fixed-length sequence of `f32` components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Check that the vector has exactly `expected` components.
    pub fn check_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }

    /// Reject NaN and infinite components.
    pub fn check_finite(&self) -> Result<()> {
        match self.data.iter().position(|x| !x.is_finite()) {
            Some(pos) => Err(VectorStoreError::InvalidVector {
                reason: format!("component {} is not finite ({})", pos, self.data[pos]),
            }),
            None => Ok(()),
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Parses a comma-separated list such as `"1.0, 2.0, 3.0"`.
impl FromStr for Vector {
    type Err = VectorStoreError;

    fn from_str(s: &str) -> Result<Self> {
        let data: Result<Vec<f32>> = s
            .split(',')
            .map(|x| {
                x.trim()
                    .parse::<f32>()
                    .map_err(|_| VectorStoreError::InvalidVector {
                        reason: format!("Invalid float: {}", x),
                    })
            })
            .collect();
        Ok(Vector::new(data?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_creation() {
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.dimension(), 3);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_str() {
        let v: Vector = "1.0, 2.0, 3.0".parse().unwrap();
        assert_eq!(v.dimension(), 3);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let result = "1.0, abc".parse::<Vector>();
        assert!(matches!(result, Err(VectorStoreError::InvalidVector { .. })));
    }

    #[test]
    fn test_check_dimension() {
        let v = Vector::new(vec![1.0, 2.0]);
        assert!(v.check_dimension(2).is_ok());
        assert!(matches!(
            v.check_dimension(3),
            Err(VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_check_finite() {
        assert!(Vector::new(vec![0.0, -1.5]).check_finite().is_ok());
        assert!(Vector::new(vec![0.0, f32::NAN]).check_finite().is_err());
        assert!(Vector::new(vec![f32::INFINITY]).check_finite().is_err());
    }
}
