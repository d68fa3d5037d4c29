//! Ships every participant its rows of A and a full copy of B.

use crate::comm::{Communicator, ROOT};
use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::partition::{ARows, ElementLayout, PartitionPlan};
use crate::slice::LocalSlice;
use tracing::{debug, instrument};

/// Scatter A by `a_layout` and broadcast B.
///
/// `source_a` is `Some` on the root only. `shared_b` must be K x N on every
/// participant; on workers its contents are overwritten, on the root it is the
/// source and left unchanged. Returns this participant's A slice.
#[instrument(skip_all, fields(rank = comm.rank()))]
pub fn distribute<C, T>(
    comm: &C,
    plan: &PartitionPlan,
    a_layout: &ElementLayout<ARows>,
    source_a: Option<&Matrix<T>>,
    shared_b: &mut Matrix<T>,
) -> Result<LocalSlice<T>>
where
    C: Communicator,
    T: Element,
{
    let k = a_layout.width();
    let span = plan.span(comm.rank())?;

    if let Some(a) = source_a {
        if a.rows != plan.total_rows() || a.cols != k {
            return Err(MatmulError::Dimension(format!(
                "A is {}x{}, round expects {}x{}",
                a.rows,
                a.cols,
                plan.total_rows(),
                k
            )));
        }
    }
    if shared_b.rows != k {
        return Err(MatmulError::Dimension(format!(
            "B has {} rows, A rows are {} wide",
            shared_b.rows, k
        )));
    }

    let mut local = vec![T::default(); a_layout.count(comm.rank())];
    let send = source_a.map(|a| (&a.data[..], a_layout.as_varcount()));
    comm.scatter_varcount(ROOT, send, &mut local)?;
    debug!(
        rows = span.rows,
        offset = span.offset,
        elements = local.len(),
        "received A slice"
    );

    comm.broadcast(ROOT, &mut shared_b.data)?;
    debug!(rows = shared_b.rows, cols = shared_b.cols, "received B");

    LocalSlice::from_span(span, k, local)
}
