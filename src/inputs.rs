//! Initializers that fill A and B on the coordinator before a round.

use crate::config::{Dimensions, InputSource};
use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;
use tracing::info;

/// The 5x3 A and 3x2 B used as the reference scenario.
pub fn reference() -> (Matrix<i64>, Matrix<i64>) {
    let a = Matrix::from_fn(5, 3, |i, j| (i * 3 + j + 1) as i64);
    let b = Matrix::from_fn(3, 2, |i, j| (j * 3 + i + 1) as i64);
    (a, b)
}

/// Small repeating values so products stay far from overflow.
pub fn sequential(dims: Dimensions) -> (Matrix<i64>, Matrix<i64>) {
    let a = Matrix::from_fn(dims.m, dims.k, |i, j| ((i * dims.k + j) % 10) as i64 + 1);
    let b = Matrix::from_fn(dims.k, dims.n, |i, j| ((i + 2 * j) % 7) as i64 - 3);
    (a, b)
}

/// Build A and B for `source`.
pub fn load(source: &InputSource, dims: Dimensions) -> Result<(Matrix<i64>, Matrix<i64>)> {
    let (a, b) = match source {
        InputSource::Reference => reference(),
        InputSource::Sequential => sequential(dims),
        InputSource::Files { a, b } => {
            info!(a = %a.display(), b = %b.display(), "Loading matrices");
            let a = Matrix::load_from_file(a)
                .map_err(|e| MatmulError::Config(format!("Failed to load matrix A: {}", e)))?;
            let b = Matrix::load_from_file(b)
                .map_err(|e| MatmulError::Config(format!("Failed to load matrix B: {}", e)))?;
            (a, b)
        }
    };
    info!(
        a_rows = a.rows,
        a_cols = a.cols,
        b_rows = b.rows,
        b_cols = b.cols,
        "Inputs ready"
    );
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        let (a, b) = reference();
        assert_eq!(a.data, (1..=15).collect::<Vec<i64>>());
        assert_eq!(b.data, vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_sequential_shapes() {
        let (a, b) = sequential(Dimensions { m: 4, k: 6, n: 3 });
        assert_eq!((a.rows, a.cols), (4, 6));
        assert_eq!((b.rows, b.cols), (6, 3));
    }
}
