use crate::error::{MatmulError, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::ops::{Add, Mul};
use std::path::Path;
use std::str::FromStr;

/// Numeric element a matrix can hold. Accumulation stays in the element type.
#[cfg(not(feature = "mpi"))]
pub trait Element:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Add<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
}

#[cfg(not(feature = "mpi"))]
impl<T> Element for T where
    T: Copy
        + Default
        + PartialEq
        + fmt::Debug
        + fmt::Display
        + FromStr
        + Add<Output = T>
        + Mul<Output = T>
        + Send
        + Sync
        + 'static
{
}

/// Numeric element a matrix can hold. Accumulation stays in the element type.
#[cfg(feature = "mpi")]
pub trait Element:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Add<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
    + mpi::datatype::Equivalence
{
}

#[cfg(feature = "mpi")]
impl<T> Element for T where
    T: Copy
        + Default
        + PartialEq
        + fmt::Debug
        + fmt::Display
        + FromStr
        + Add<Output = T>
        + Mul<Output = T>
        + Send
        + Sync
        + 'static
        + mpi::datatype::Equivalence
{
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    pub data: Vec<T>,
    pub rows: usize,
    pub cols: usize,
}

impl<T: Element> Matrix<T> {
    /// Create a zero-filled matrix with the given dimensions
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }

    /// Create a matrix from a row-major vector of data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(MatmulError::Dimension(format!(
                "Data length {} does not match dimensions {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Matrix { data, rows, cols })
    }

    /// Create a matrix by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { data, rows, cols }
    }

    /// Load a matrix from a text file
    /// Format: whitespace-separated values, one row per line
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse a matrix from any buffered reader in the text format
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut rows = Vec::new();
        let mut num_cols = None;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let values = trimmed
                .split_whitespace()
                .map(|s| {
                    s.parse::<T>().map_err(|_| {
                        MatmulError::Parse(format!(
                            "Failed to parse value '{}' on line {}",
                            s,
                            line_num + 1
                        ))
                    })
                })
                .collect::<Result<Vec<T>>>()?;

            match num_cols {
                Some(n) if n != values.len() => {
                    return Err(MatmulError::Parse(format!(
                        "Inconsistent column count: expected {}, found {} on line {}",
                        n,
                        values.len(),
                        line_num + 1
                    )));
                }
                None => num_cols = Some(values.len()),
                _ => {}
            }

            rows.push(values);
        }

        let cols = num_cols.ok_or_else(|| MatmulError::Parse("Matrix file is empty".to_string()))?;
        let rows_count = rows.len();
        let data: Vec<T> = rows.into_iter().flatten().collect();

        Ok(Matrix {
            data,
            rows: rows_count,
            cols,
        })
    }

    /// Save a matrix to a text file
    /// Format: space-separated values, one row per line
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the matrix in the text format, every row newline-terminated
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write!(writer, "{}", self)?;
        Ok(())
    }

    /// Get a value at a specific position
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.check_bounds(row, col)?;
        Ok(self.data[row * self.cols + col])
    }

    /// Set a value at a specific position
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Get a row as a slice
    pub fn get_row(&self, row: usize) -> Result<&[T]> {
        if row >= self.rows {
            return Err(MatmulError::Dimension(format!(
                "Row index {} out of bounds for {} rows",
                row, self.rows
            )));
        }
        Ok(self.row(row))
    }

    /// Get a submatrix of `num_rows` contiguous rows starting at `start_row`
    pub fn get_row_chunk(&self, start_row: usize, num_rows: usize) -> Result<Matrix<T>> {
        if start_row + num_rows > self.rows {
            return Err(MatmulError::Dimension(format!(
                "Row chunk out of bounds: start={}, num_rows={}, total_rows={}",
                start_row, num_rows, self.rows
            )));
        }

        let start = start_row * self.cols;
        let end = start + num_rows * self.cols;
        Ok(Matrix {
            data: self.data[start..end].to_vec(),
            rows: num_rows,
            cols: self.cols,
        })
    }

    /// Serial baseline: C[i][j] = sum(A[i][k] * B[k][j])
    pub fn multiply(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        if self.cols != other.rows {
            return Err(MatmulError::Dimension(format!(
                "Matrix dimensions incompatible: {}x{} * {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut result = Matrix::new(self.rows, other.cols);

        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = T::default();
                for k in 0..self.cols {
                    sum = sum + self.data[i * self.cols + k] * other.data[k * other.cols + j];
                }
                result.data[i * other.cols + j] = sum;
            }
        }

        Ok(result)
    }

    fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(MatmulError::Dimension(format!(
                "Index out of bounds: ({}, {}) for matrix {}x{}",
                row, col, self.rows, self.cols
            )));
        }
        Ok(())
    }
}

impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row = self.row(i);
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_is_newline_terminated() {
        let m = Matrix::from_vec(vec![14i64, 32, 32, 77], 2, 2).unwrap();
        let mut out = Vec::new();
        m.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "14 32\n32 77\n");
    }

    #[test]
    fn test_display_matches_write_to() {
        let m = Matrix::from_vec(vec![1i32, 2, 3], 1, 3).unwrap();
        let mut out = Vec::new();
        m.write_to(&mut out).unwrap();
        assert_eq!(m.to_string(), String::from_utf8(out).unwrap());
    }

    #[test]
    fn test_read_from_rejects_garbage() {
        let err = Matrix::<i64>::read_from("1 2\n3 x\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_from_fn_row_major() {
        let m = Matrix::from_fn(2, 3, |i, j| (i * 10 + j) as i64);
        assert_eq!(m.data, vec![0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_zero_row_chunk() {
        let m = Matrix::<i64>::new(3, 2);
        let chunk = m.get_row_chunk(3, 0).unwrap();
        assert_eq!(chunk.rows, 0);
        assert!(chunk.data.is_empty());
    }
}
