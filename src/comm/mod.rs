//! Collective message passing between participants.
//!
//! Three primitives cover a round: scatter with variable counts, broadcast and
//! gather with variable counts. Each one blocks every participant until all of
//! them have taken part, so returning from a collective means every peer holds
//! its data. A participant that never arrives stalls the others; transports
//! report it as [`MatmulError::Participation`](crate::error::MatmulError) when
//! they can detect it and otherwise wait.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

use crate::error::Result;
use crate::matrix::Element;
use crate::partition::VarCount;

pub use local::{local_world, LocalCommunicator};

/// Rank of the coordinator in every world.
pub const ROOT: usize = 0;

/// A participant-addressed channel offering the round's collectives.
pub trait Communicator {
    /// This participant's rank, `0..size()`
    fn rank(&self) -> usize;

    /// Number of participants in the world
    fn size(&self) -> usize;

    /// Split `send` on `root` by `layout` and deliver each piece to its rank.
    ///
    /// `send` is only read on `root` and must be `None` elsewhere. Every
    /// participant's `recv` must be exactly its count long.
    fn scatter_varcount<T: Element>(
        &self,
        root: usize,
        send: Option<(&[T], VarCount<'_>)>,
        recv: &mut [T],
    ) -> Result<()>;

    /// Overwrite `buf` on every participant with `root`'s `buf`.
    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()>;

    /// Collect every participant's `send` into `root`'s buffer at the
    /// displacements given by `layout`.
    ///
    /// `recv` is only written on `root` and must be `None` elsewhere.
    fn gather_varcount<T: Element>(
        &self,
        root: usize,
        send: &[T],
        recv: Option<(&mut [T], VarCount<'_>)>,
    ) -> Result<()>;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }
}
