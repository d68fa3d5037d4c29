use crate::collector;
use crate::comm::Communicator;
use crate::distributor;
use crate::error::{MatmulError, Result};
use crate::kernel;
use crate::matrix::{Element, Matrix};
use crate::participant::Participant;
use crate::round::{self, RoundSetup};
use crate::slice::LocalSlice;
use tracing::{debug, info, instrument};

/// A non-root participant: receives its rows, multiplies, sends them back.
pub struct Worker<C: Communicator, T: Element> {
    comm: C,
    setup: Option<RoundSetup>,
    b: Matrix<T>,
    local_a: Option<LocalSlice<T>>,
    local_c: Option<LocalSlice<T>>,
}

impl<C: Communicator, T: Element> Worker<C, T> {
    /// Create a new worker
    pub fn new(comm: C) -> Self {
        Worker {
            comm,
            setup: None,
            b: Matrix::new(0, 0),
            local_a: None,
            local_c: None,
        }
    }

    /// Plan of the current round, once agreed
    pub fn setup(&self) -> Option<&RoundSetup> {
        self.setup.as_ref()
    }

    /// Local A rows received in this round
    pub fn local_a(&self) -> Option<&LocalSlice<T>> {
        self.local_a.as_ref()
    }

    /// Local C rows computed in this round, until they are sent
    pub fn local_c(&self) -> Option<&LocalSlice<T>> {
        self.local_c.as_ref()
    }

    /// This worker's replica of B
    pub fn shared_b(&self) -> &Matrix<T> {
        &self.b
    }

    /// Take part in one full round
    #[instrument(skip(self), fields(rank = self.comm.rank()))]
    pub fn process_work(&mut self) -> Result<()> {
        debug!("Waiting for round dimensions");
        self.run_round()?;
        info!("Work complete");
        Ok(())
    }

    fn require_setup(&self, step: &'static str) -> Result<&RoundSetup> {
        self.setup.as_ref().ok_or(MatmulError::State {
            from: "init",
            to: step,
        })
    }
}

impl<C: Communicator, T: Element> Participant for Worker<C, T> {
    type Elem = T;

    fn rank(&self) -> usize {
        self.comm.rank()
    }

    fn plan_round(&mut self) -> Result<()> {
        let dims = round::agree_dimensions(&self.comm, None)?;
        let setup = RoundSetup::new(dims, self.comm.size())?;
        let span = setup.plan.span(self.comm.rank())?;
        debug!(
            rank = self.comm.rank(),
            m = dims.m,
            k = dims.k,
            n = dims.n,
            rows = span.rows,
            offset = span.offset,
            "Received assignment"
        );
        self.setup = Some(setup);
        Ok(())
    }

    fn receive_slice(&mut self) -> Result<()> {
        let setup = self.require_setup("distributed")?;
        // Sized for this round; stale data from an earlier round is overwritten.
        let mut b = Matrix::new(setup.dims.k, setup.dims.n);
        let local_a = distributor::distribute(&self.comm, &setup.plan, &setup.a_layout, None, &mut b)?;
        self.b = b;
        self.local_a = Some(local_a);
        self.local_c = None;
        Ok(())
    }

    fn compute(&mut self) -> Result<()> {
        let local_a = self.local_a.as_ref().ok_or(MatmulError::State {
            from: "partitioned",
            to: "computed",
        })?;
        let local_c = kernel::multiply_slice(local_a, &self.b)?;
        debug!(
            rank = self.comm.rank(),
            rows = local_c.rows(),
            cols = local_c.cols(),
            "Computed result"
        );
        self.local_c = Some(local_c);
        Ok(())
    }

    fn send_slice(&mut self) -> Result<()> {
        let setup = self.require_setup("collected")?;
        let local_c = self.local_c.as_ref().ok_or(MatmulError::State {
            from: "distributed",
            to: "collected",
        })?;
        collector::collect(&self.comm, &setup.c_layout, local_c, None)?;
        self.local_a = None;
        self.local_c = None;
        Ok(())
    }
}
