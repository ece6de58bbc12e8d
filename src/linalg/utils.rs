use ndarray::{Array2, ArrayView1, Axis};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Self outer product `v vᵗ` of a vector; entry `(i, j)` is `v[i] * v[j]`.
///
/// An empty vector yields a `0 x 0` matrix.
pub fn outer_product(v: ArrayView1<'_, f64>) -> Array2<f64> {
    let column = v.insert_axis(Axis(1));
    let row = v.insert_axis(Axis(0));
    column.dot(&row)
}

/// Adds `weight * v vᵗ` into the square matrix `target` in place.
///
/// This is the rank-one contribution a covariance estimate collects per data
/// point from the parameter gradient at that point.
pub fn accumulate_outer_product(
    target: &mut Array2<f64>,
    v: ArrayView1<'_, f64>,
    weight: f64,
) -> Result<(), LinalgError> {
    let n = v.len();
    if target.dim() != (n, n) {
        return Err(LinalgError::DimensionMismatch(format!(
            "target is {}x{}, vector has length {}",
            target.nrows(),
            target.ncols(),
            n
        )));
    }
    target.scaled_add(weight, &outer_product(v));
    Ok(())
}
