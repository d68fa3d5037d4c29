//! MPI transport over rsmpi, for runs launched with `mpirun`.
//!
//! Each collective is followed by an explicit barrier since MPI collectives
//! are not required to synchronize.

use super::Communicator;
use crate::error::{MatmulError, Result};
use crate::matrix::Element;
use crate::partition::VarCount;
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as MpiCommunicator, Root};
use mpi::Count;
use tracing::debug;

fn to_counts(values: &[usize]) -> Result<Vec<Count>> {
    values
        .iter()
        .map(|&v| {
            Count::try_from(v).map_err(|_| {
                MatmulError::Transport(format!("{} elements exceed the MPI count range", v))
            })
        })
        .collect()
}

fn root_rank(root: usize) -> Result<i32> {
    i32::try_from(root)
        .map_err(|_| MatmulError::Config(format!("root {} exceeds the MPI rank range", root)))
}

impl Communicator for SimpleCommunicator {
    fn rank(&self) -> usize {
        MpiCommunicator::rank(self) as usize
    }

    fn size(&self) -> usize {
        MpiCommunicator::size(self) as usize
    }

    fn scatter_varcount<T: Element>(
        &self,
        root: usize,
        send: Option<(&[T], VarCount<'_>)>,
        recv: &mut [T],
    ) -> Result<()> {
        let root_process = self.process_at_rank(root_rank(root)?);
        match send {
            Some((buffer, layout)) => {
                let partition =
                    Partition::new(buffer, to_counts(layout.counts)?, to_counts(layout.displs)?);
                root_process.scatter_varcount_into_root(&partition, recv);
            }
            None => root_process.scatter_varcount_into(recv),
        }
        debug!(rank = Communicator::rank(self), received = recv.len(), "scatter complete");
        self.barrier();
        Ok(())
    }

    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()> {
        let root_process = self.process_at_rank(root_rank(root)?);
        root_process.broadcast_into(buf);
        self.barrier();
        Ok(())
    }

    fn gather_varcount<T: Element>(
        &self,
        root: usize,
        send: &[T],
        recv: Option<(&mut [T], VarCount<'_>)>,
    ) -> Result<()> {
        let root_process = self.process_at_rank(root_rank(root)?);
        match recv {
            Some((buffer, layout)) => {
                let counts = to_counts(layout.counts)?;
                let displs = to_counts(layout.displs)?;
                let mut partition = PartitionMut::new(buffer, counts, displs);
                root_process.gather_varcount_into_root(send, &mut partition);
            }
            None => root_process.gather_varcount_into(send),
        }
        debug!(rank = Communicator::rank(self), sent = send.len(), "gather complete");
        self.barrier();
        Ok(())
    }
}
