use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::partition::RowSpan;

/// A participant's private row range of A or C for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSlice<T> {
    /// Row of the full matrix this slice starts at
    pub first_row: usize,
    pub block: Matrix<T>,
}

impl<T: Element> LocalSlice<T> {
    /// Wrap `data` as the rows described by `span`, each `cols` wide
    pub fn from_span(span: RowSpan, cols: usize, data: Vec<T>) -> Result<Self> {
        let block = Matrix::from_vec(data, span.rows, cols).map_err(|e| {
            MatmulError::Dimension(format!(
                "slice at row {} ({} rows): {}",
                span.offset, span.rows, e
            ))
        })?;
        Ok(LocalSlice {
            first_row: span.offset,
            block,
        })
    }

    pub fn rows(&self) -> usize {
        self.block.rows
    }

    pub fn cols(&self) -> usize {
        self.block.cols
    }

    pub fn span(&self) -> RowSpan {
        RowSpan {
            rows: self.block.rows,
            offset: self.first_row,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block.rows == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.block.data
    }
}
