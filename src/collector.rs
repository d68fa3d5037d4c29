//! Reassembles every participant's C rows on the coordinator.

use crate::comm::{Communicator, ROOT};
use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::partition::{CRows, ElementLayout};
use crate::slice::LocalSlice;
use tracing::{debug, instrument};

/// Gather `local_c` from every participant into `dest` using `c_layout`.
///
/// `dest` is `Some` on the root only and must be M x N. Each slice lands at
/// `row_offset * N`, so C keeps rows 0..M in order whatever the participant
/// count.
#[instrument(skip_all, fields(rank = comm.rank()))]
pub fn collect<C, T>(
    comm: &C,
    c_layout: &ElementLayout<CRows>,
    local_c: &LocalSlice<T>,
    dest: Option<&mut Matrix<T>>,
) -> Result<()>
where
    C: Communicator,
    T: Element,
{
    let n = c_layout.width();
    let expected = c_layout.count(comm.rank());
    if local_c.cols() != n || local_c.as_slice().len() != expected {
        return Err(MatmulError::Dimension(format!(
            "local C is {}x{}, layout expects {} elements of width {}",
            local_c.rows(),
            local_c.cols(),
            expected,
            n
        )));
    }

    let recv = match dest {
        Some(c) => {
            if c.cols != n || c.data.len() != c_layout.total() {
                return Err(MatmulError::Dimension(format!(
                    "C is {}x{}, layout covers {} elements of width {}",
                    c.rows,
                    c.cols,
                    c_layout.total(),
                    n
                )));
            }
            Some((&mut c.data[..], c_layout.as_varcount()))
        }
        None => None,
    };

    comm.gather_varcount(ROOT, local_c.as_slice(), recv)?;
    debug!(
        first_row = local_c.first_row,
        rows = local_c.rows(),
        "contributed C slice"
    );
    Ok(())
}
