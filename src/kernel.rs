//! Local multiply run by every participant on its own rows.

use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::slice::LocalSlice;
use rayon::prelude::*;

/// Multiply a row block by the full right-hand matrix.
///
/// Output rows are independent, so they are computed in parallel. Each cell is
/// accumulated over k in order, matching [`Matrix::multiply`] bit for bit.
pub fn multiply_rows<T: Element>(rows: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    if rows.cols != b.rows {
        return Err(MatmulError::Dimension(format!(
            "Chunk dimensions incompatible: {}x{} * {}x{}",
            rows.rows, rows.cols, b.rows, b.cols
        )));
    }

    let (k, n) = (rows.cols, b.cols);
    let mut result = Matrix::new(rows.rows, n);
    if rows.rows == 0 || k == 0 || n == 0 {
        return Ok(result);
    }

    result
        .data
        .par_chunks_mut(n)
        .zip(rows.data.par_chunks(k))
        .for_each(|(c_row, a_row)| {
            for (kk, &a_ik) in a_row.iter().enumerate() {
                let b_row = &b.data[kk * n..(kk + 1) * n];
                for (c, &b_kj) in c_row.iter_mut().zip(b_row) {
                    *c = *c + a_ik * b_kj;
                }
            }
        });

    Ok(result)
}

/// Compute a participant's C slice from its A slice. The result covers the
/// same rows as `a_slice`.
pub fn multiply_slice<T: Element>(a_slice: &LocalSlice<T>, b: &Matrix<T>) -> Result<LocalSlice<T>> {
    let block = multiply_rows(&a_slice.block, b)?;
    Ok(LocalSlice {
        first_row: a_slice.first_row,
        block,
    })
}
