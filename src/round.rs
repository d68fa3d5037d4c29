//! Per-round bookkeeping shared by both roles.

use crate::comm::{Communicator, ROOT};
use crate::config::Dimensions;
use crate::error::{MatmulError, Result};
use crate::partition::{self, ARows, CRows, ElementLayout, PartitionPlan};
use tracing::debug;

/// Progress of a round as observed from the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundState {
    #[default]
    Init,
    Partitioned,
    Distributed,
    Computed,
    Collected,
    Done,
}

impl RoundState {
    pub fn name(self) -> &'static str {
        match self {
            RoundState::Init => "init",
            RoundState::Partitioned => "partitioned",
            RoundState::Distributed => "distributed",
            RoundState::Computed => "computed",
            RoundState::Collected => "collected",
            RoundState::Done => "done",
        }
    }

    fn next(self) -> Option<RoundState> {
        match self {
            RoundState::Init => Some(RoundState::Partitioned),
            RoundState::Partitioned => Some(RoundState::Distributed),
            RoundState::Distributed => Some(RoundState::Computed),
            RoundState::Computed => Some(RoundState::Collected),
            RoundState::Collected => Some(RoundState::Done),
            RoundState::Done => None,
        }
    }

    /// Move one step forward to `to`. Skipping or repeating a step is an error.
    pub fn advance(&mut self, to: RoundState) -> Result<()> {
        if self.next() != Some(to) {
            return Err(MatmulError::State {
                from: self.name(),
                to: to.name(),
            });
        }
        debug!(from = self.name(), to = to.name(), "round state");
        *self = to;
        Ok(())
    }

    /// Fail unless the round is currently in `expected`, reporting `to` as the
    /// transition that was attempted
    pub fn require(self, expected: RoundState, to: RoundState) -> Result<()> {
        if self != expected {
            return Err(MatmulError::State {
                from: self.name(),
                to: to.name(),
            });
        }
        Ok(())
    }
}

/// Plan and the two element layouts every participant derives for a round.
#[derive(Debug, Clone)]
pub struct RoundSetup {
    pub dims: Dimensions,
    pub plan: PartitionPlan,
    /// Scatter layout, scaled by K
    pub a_layout: ElementLayout<ARows>,
    /// Gather layout, scaled by N
    pub c_layout: ElementLayout<CRows>,
}

impl RoundSetup {
    pub fn new(dims: Dimensions, participants: usize) -> Result<Self> {
        let plan = partition::plan(dims.m, participants)?;
        let a_layout = plan.layout::<ARows>(dims.k);
        let c_layout = plan.layout::<CRows>(dims.n);
        Ok(RoundSetup {
            dims,
            plan,
            a_layout,
            c_layout,
        })
    }
}

/// Broadcast the coordinator's M, K, N so every participant plans the same
/// round. Only the root passes `Some`.
pub fn agree_dimensions<C: Communicator>(comm: &C, proposed: Option<Dimensions>) -> Result<Dimensions> {
    let mut wire = [0u64; 3];
    if let Some(dims) = proposed {
        wire = [dims.m as u64, dims.k as u64, dims.n as u64];
    } else if comm.rank() == ROOT {
        return Err(MatmulError::Config(
            "coordinator must supply the round dimensions".to_string(),
        ));
    }

    comm.broadcast(ROOT, &mut wire)?;

    let to_usize = |v: u64| {
        usize::try_from(v).map_err(|_| {
            MatmulError::Transport(format!("dimension {} does not fit this platform", v))
        })
    };
    Ok(Dimensions {
        m: to_usize(wire[0])?,
        k: to_usize(wire[1])?,
        n: to_usize(wire[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_advance_in_order() {
        let mut state = RoundState::default();
        for to in [
            RoundState::Partitioned,
            RoundState::Distributed,
            RoundState::Computed,
            RoundState::Collected,
            RoundState::Done,
        ] {
            state.advance(to).unwrap();
        }
        assert_eq!(state, RoundState::Done);
    }

    #[test]
    fn test_skipping_a_state_fails() {
        let mut state = RoundState::Partitioned;
        let err = state.advance(RoundState::Collected).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Round state error: cannot move from partitioned to collected"
        );
        assert_eq!(state, RoundState::Partitioned);
    }

    #[test]
    fn test_setup_layouts_use_distinct_widths() {
        let setup = RoundSetup::new(Dimensions { m: 5, k: 3, n: 2 }, 2).unwrap();
        assert_eq!(setup.a_layout.counts(), &[9, 6]);
        assert_eq!(setup.c_layout.counts(), &[6, 4]);
        assert_eq!(setup.c_layout.displs(), &[0, 6]);
    }
}
