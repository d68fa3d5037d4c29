use crate::collector;
use crate::comm::Communicator;
use crate::config::Dimensions;
use crate::distributor;
use crate::error::{MatmulError, Result};
use crate::kernel;
use crate::matrix::{Element, Matrix};
use crate::output::{self, OutputOptions, OutputReport};
use crate::participant::Participant;
use crate::round::{self, RoundSetup, RoundState};
use crate::slice::LocalSlice;
use tracing::{debug, info, instrument};

/// The root participant. Owns the full A, B and C and drives the round; it
/// also computes its own share of the rows.
pub struct Coordinator<C: Communicator, T: Element> {
    comm: C,
    state: RoundState,
    setup: Option<RoundSetup>,
    a: Option<Matrix<T>>,
    b: Option<Matrix<T>>,
    c: Option<Matrix<T>>,
    local_a: Option<LocalSlice<T>>,
    local_c: Option<LocalSlice<T>>,
}

impl<C: Communicator, T: Element> Coordinator<C, T> {
    /// Create a new coordinator
    pub fn new(comm: C) -> Self {
        Coordinator {
            comm,
            state: RoundState::Init,
            setup: None,
            a: None,
            b: None,
            c: None,
            local_a: None,
            local_c: None,
        }
    }

    /// Number of participants, this coordinator included
    pub fn participant_count(&self) -> usize {
        self.comm.size()
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Plan of the current round, once partitioned
    pub fn setup(&self) -> Option<&RoundSetup> {
        self.setup.as_ref()
    }

    /// Coordinator's own C rows, between compute and collection
    pub fn local_c(&self) -> Option<&LocalSlice<T>> {
        self.local_c.as_ref()
    }

    /// Install A and B for the next round. A finished round is discarded.
    pub fn load_inputs(&mut self, a: Matrix<T>, b: Matrix<T>) -> Result<()> {
        match self.state {
            RoundState::Init => {}
            RoundState::Done => self.reset(),
            other => {
                return Err(MatmulError::State {
                    from: other.name(),
                    to: RoundState::Init.name(),
                })
            }
        }

        if a.cols != b.rows {
            return Err(MatmulError::Dimension(format!(
                "Matrix dimensions incompatible: A is {}x{}, B is {}x{}",
                a.rows, a.cols, b.rows, b.cols
            )));
        }
        info!(
            a_rows = a.rows,
            a_cols = a.cols,
            b_rows = b.rows,
            b_cols = b.cols,
            "Inputs loaded"
        );
        self.a = Some(a);
        self.b = Some(b);
        Ok(())
    }

    /// Mark the collected C as final and return it
    pub fn assemble(&mut self) -> Result<&Matrix<T>> {
        self.state.advance(RoundState::Done)?;
        let c = self.c.as_ref().ok_or(MatmulError::State {
            from: RoundState::Collected.name(),
            to: RoundState::Done.name(),
        })?;
        info!(rows = c.rows, cols = c.cols, "Multiplication complete");
        Ok(c)
    }

    /// Print and/or persist the final C. Output failures are logged and
    /// reported, never returned as errors.
    pub fn emit_output(&self, options: &OutputOptions) -> Result<OutputReport> {
        self.state.require(RoundState::Done, RoundState::Done)?;
        let c = self.result()?;
        let stdout = std::io::stdout();
        let mut console = stdout.lock();
        Ok(output::emit(c, options, &mut console))
    }

    /// Final C of a finished round
    pub fn result(&self) -> Result<&Matrix<T>> {
        self.state.require(RoundState::Done, RoundState::Done)?;
        self.c.as_ref().ok_or(MatmulError::State {
            from: self.state.name(),
            to: RoundState::Done.name(),
        })
    }

    /// Take ownership of the final C, leaving the coordinator ready for new inputs
    pub fn take_result(&mut self) -> Result<Matrix<T>> {
        self.result()?;
        let c = self.c.take().ok_or(MatmulError::State {
            from: self.state.name(),
            to: RoundState::Done.name(),
        })?;
        self.reset();
        Ok(c)
    }

    /// Run a complete round on `a` and `b`, emit the output and return C
    #[instrument(skip_all, fields(participants = self.comm.size()))]
    pub fn multiply_matrices(
        &mut self,
        a: Matrix<T>,
        b: Matrix<T>,
        output: &OutputOptions,
    ) -> Result<Matrix<T>> {
        self.load_inputs(a, b)?;
        self.run_round()?;
        self.assemble()?;
        let report = self.emit_output(output)?;
        if !report.errors.is_empty() {
            debug!(errors = report.errors.len(), "Output finished with errors");
        }
        self.take_result()
    }

    fn reset(&mut self) {
        self.state = RoundState::Init;
        self.setup = None;
        self.a = None;
        self.b = None;
        self.c = None;
        self.local_a = None;
        self.local_c = None;
    }

    fn inputs(&self) -> Result<(&Matrix<T>, &Matrix<T>)> {
        match (&self.a, &self.b) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(MatmulError::Config(
                "inputs must be loaded before the round starts".to_string(),
            )),
        }
    }
}

impl<C: Communicator, T: Element> Participant for Coordinator<C, T> {
    type Elem = T;

    fn rank(&self) -> usize {
        self.comm.rank()
    }

    fn plan_round(&mut self) -> Result<()> {
        self.state.require(RoundState::Init, RoundState::Partitioned)?;
        let (a, b) = self.inputs()?;
        let dims = Dimensions {
            m: a.rows,
            k: a.cols,
            n: b.cols,
        };

        let dims = round::agree_dimensions(&self.comm, Some(dims))?;
        let setup = RoundSetup::new(dims, self.comm.size())?;
        for (rank, span) in setup.plan.spans().iter().enumerate() {
            debug!(
                rank,
                rows = span.rows,
                offset = span.offset,
                "Assigning rows [{}, {})",
                span.offset,
                span.end()
            );
        }
        info!(
            m = dims.m,
            k = dims.k,
            n = dims.n,
            participants = self.comm.size(),
            "Round partitioned"
        );
        self.setup = Some(setup);
        self.state.advance(RoundState::Partitioned)
    }

    fn receive_slice(&mut self) -> Result<()> {
        self.state.require(RoundState::Partitioned, RoundState::Distributed)?;
        let (setup, a, b) = match (&self.setup, &self.a, &mut self.b) {
            (Some(setup), Some(a), Some(b)) => (setup, a, b),
            _ => {
                return Err(MatmulError::State {
                    from: self.state.name(),
                    to: RoundState::Distributed.name(),
                })
            }
        };
        let local_a = distributor::distribute(&self.comm, &setup.plan, &setup.a_layout, Some(a), b)?;
        self.local_a = Some(local_a);
        info!("A scattered and B broadcast");
        self.state.advance(RoundState::Distributed)
    }

    fn compute(&mut self) -> Result<()> {
        self.state.require(RoundState::Distributed, RoundState::Computed)?;
        let (local_a, b) = match (&self.local_a, &self.b) {
            (Some(local_a), Some(b)) => (local_a, b),
            _ => {
                return Err(MatmulError::State {
                    from: self.state.name(),
                    to: RoundState::Computed.name(),
                })
            }
        };
        let local_c = kernel::multiply_slice(local_a, b)?;
        debug!(rows = local_c.rows(), "Computed own rows");
        self.local_c = Some(local_c);
        self.state.advance(RoundState::Computed)
    }

    fn send_slice(&mut self) -> Result<()> {
        self.state.require(RoundState::Computed, RoundState::Collected)?;
        let (setup, local_c) = match (&self.setup, &self.local_c) {
            (Some(setup), Some(local_c)) => (setup, local_c),
            _ => {
                return Err(MatmulError::State {
                    from: self.state.name(),
                    to: RoundState::Collected.name(),
                })
            }
        };
        let mut c = Matrix::new(setup.dims.m, setup.dims.n);
        info!("Collecting results from workers");
        collector::collect(&self.comm, &setup.c_layout, local_c, Some(&mut c))?;
        self.c = Some(c);
        self.local_a = None;
        self.local_c = None;
        self.state.advance(RoundState::Collected)
    }
}
