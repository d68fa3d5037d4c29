use crate::error::Result;
use crate::matrix::Element;

/// What every member of a world does in a round.
///
/// [`Worker`](crate::worker::Worker) and
/// [`Coordinator`](crate::coordinator::Coordinator) implement it; the role is
/// picked once from the rank instead of branching on it at every step.
pub trait Participant {
    type Elem: Element;

    fn rank(&self) -> usize;

    /// Agree on the round's dimensions and derive the partition plan
    fn plan_round(&mut self) -> Result<()>;

    /// Take part in distribution and keep this participant's A slice and B
    fn receive_slice(&mut self) -> Result<()>;

    /// Multiply the local A slice by B
    fn compute(&mut self) -> Result<()>;

    /// Take part in collection with the local C slice
    fn send_slice(&mut self) -> Result<()>;

    fn run_round(&mut self) -> Result<()> {
        self.plan_round()?;
        self.receive_slice()?;
        self.compute()?;
        self.send_slice()
    }
}
