//! Starting a world of participants.
//!
//! [`run_local`] stands in for an external launcher: it starts every
//! participant as a thread over [`LocalCommunicator`](crate::comm::LocalCommunicator)
//! and tears them all down after the round.

use crate::comm::{local_world, Communicator};
use crate::coordinator::Coordinator;
use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::output::OutputOptions;
use crate::worker::Worker;
use std::thread;
use tracing::{error, info};

/// Multiply `a` by `b` across `participants` in-process participants and
/// return the coordinator's C.
pub fn run_local<T: Element>(
    participants: usize,
    a: Matrix<T>,
    b: Matrix<T>,
    output: &OutputOptions,
) -> Result<Matrix<T>> {
    let mut comms = local_world(participants)?.into_iter();
    let root = comms
        .next()
        .ok_or_else(|| MatmulError::Config("empty world".to_string()))?;
    info!(participants, "Starting participants");

    thread::scope(|scope| {
        let handles: Vec<_> = comms
            .map(|comm| {
                scope.spawn(move || {
                    let rank = comm.rank();
                    let mut worker = Worker::<_, T>::new(comm);
                    worker.process_work().map_err(|e| {
                        error!(rank, error = %e, "Worker failed");
                        e
                    })
                })
            })
            .collect();

        // The coordinator's endpoint is dropped before joining so that
        // workers blocked on it observe the departure instead of waiting.
        let outcome = {
            let mut coordinator = Coordinator::new(root);
            coordinator.multiply_matrices(a, b, output)
        };
        if let Err(e) = &outcome {
            error!(error = %e, "Coordinator failed");
        }

        let mut worker_error = None;
        for (i, handle) in handles.into_iter().enumerate() {
            let rank = i + 1;
            let result = handle.join().unwrap_or_else(|_| {
                Err(MatmulError::Participation {
                    rank,
                    reason: "panicked".to_string(),
                })
            });
            if let Err(e) = result {
                let replace = match &worker_error {
                    None => true,
                    Some(MatmulError::Participation { .. }) => {
                        !matches!(e, MatmulError::Participation { .. })
                    }
                    Some(_) => false,
                };
                if replace {
                    worker_error = Some(e);
                }
            }
        }

        match (outcome, worker_error) {
            (Ok(c), None) => Ok(c),
            // A participation error on the coordinator is usually a symptom;
            // the worker's own error is the cause.
            (Err(MatmulError::Participation { .. }), Some(cause)) => Err(cause),
            (Err(e), _) => Err(e),
            (Ok(_), Some(e)) => Err(e),
        }
    })
}
