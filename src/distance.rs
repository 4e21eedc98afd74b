//! Distance kernels over raw `f32` slices

/// Squared Euclidean (L2) distance. Used for ranking; avoids the square root.
///
/// Both slices must have the same length; extra components of the longer one
/// are ignored.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
