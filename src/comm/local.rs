//! In-process transport: every participant is a thread, every ordered pair
//! of ranks has its own mpsc channel.

use super::{Communicator, ROOT};
use crate::error::{MatmulError, Result};
use crate::matrix::Element;
use crate::partition::VarCount;
use std::any::Any;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, trace};

enum Packet {
    Data(Box<dyn Any + Send>),
    /// Sent to the hub when a participant reaches the end of a collective
    Arrived,
    /// Sent by the hub once every participant has arrived
    Release,
}

impl Packet {
    fn kind(&self) -> &'static str {
        match self {
            Packet::Data(_) => "data",
            Packet::Arrived => "arrived",
            Packet::Release => "release",
        }
    }
}

/// One participant's endpoint in a [`local_world`].
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    /// `outbox[dst]` delivers to `dst`
    outbox: Vec<Sender<Packet>>,
    /// `inbox[src]` receives from `src`
    inbox: Vec<Receiver<Packet>>,
}

impl std::fmt::Debug for LocalCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

/// Build the endpoints of a world of `size` participants, indexed by rank.
pub fn local_world(size: usize) -> Result<Vec<LocalCommunicator>> {
    if size == 0 {
        return Err(MatmulError::Config(
            "participant count must be at least 1".to_string(),
        ));
    }

    let mut outboxes: Vec<Vec<Sender<Packet>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
    let mut inboxes: Vec<Vec<Receiver<Packet>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();

    for outbox in outboxes.iter_mut() {
        for inbox in inboxes.iter_mut() {
            let (tx, rx) = mpsc::channel();
            outbox.push(tx);
            inbox.push(rx);
        }
    }

    Ok(outboxes
        .into_iter()
        .zip(inboxes)
        .enumerate()
        .map(|(rank, (outbox, inbox))| LocalCommunicator {
            rank,
            size,
            outbox,
            inbox,
        })
        .collect())
}

impl LocalCommunicator {
    fn send(&self, dst: usize, packet: Packet) -> Result<()> {
        let kind = packet.kind();
        self.outbox[dst]
            .send(packet)
            .map_err(|_| MatmulError::Participation {
                rank: dst,
                reason: format!("left before receiving {} from rank {}", kind, self.rank),
            })
    }

    fn recv(&self, src: usize) -> Result<Packet> {
        self.inbox[src]
            .recv()
            .map_err(|_| MatmulError::Participation {
                rank: src,
                reason: format!("left before sending to rank {}", self.rank),
            })
    }

    fn send_data<T: Element>(&self, dst: usize, data: &[T]) -> Result<()> {
        self.send(dst, Packet::Data(Box::new(data.to_vec())))
    }

    fn recv_data<T: Element>(&self, src: usize, into: &mut [T]) -> Result<()> {
        let payload = match self.recv(src)? {
            Packet::Data(payload) => payload,
            other => {
                return Err(MatmulError::Transport(format!(
                    "rank {} expected data from rank {}, got {}",
                    self.rank,
                    src,
                    other.kind()
                )))
            }
        };
        let values = payload.downcast::<Vec<T>>().map_err(|_| {
            MatmulError::Transport(format!(
                "rank {} received a payload of the wrong element type from rank {}",
                self.rank, src
            ))
        })?;
        if values.len() != into.len() {
            return Err(MatmulError::Transport(format!(
                "rank {} expected {} elements from rank {}, got {}",
                self.rank,
                into.len(),
                src,
                values.len()
            )));
        }
        into.copy_from_slice(&values);
        Ok(())
    }

    fn expect(&self, src: usize, want: &'static str) -> Result<()> {
        let packet = self.recv(src)?;
        if packet.kind() != want {
            return Err(MatmulError::Transport(format!(
                "rank {} expected {} from rank {}, got {}",
                self.rank,
                want,
                src,
                packet.kind()
            )));
        }
        Ok(())
    }

    /// Block until every participant has called `barrier`. [`ROOT`] is the hub.
    fn barrier(&self) -> Result<()> {
        if self.rank == ROOT {
            for src in (0..self.size).filter(|&r| r != ROOT) {
                self.expect(src, "arrived")?;
            }
            for dst in (0..self.size).filter(|&r| r != ROOT) {
                self.send(dst, Packet::Release)?;
            }
        } else {
            self.send(ROOT, Packet::Arrived)?;
            self.expect(ROOT, "release")?;
        }
        trace!(rank = self.rank, "barrier passed");
        Ok(())
    }

    fn check_root(&self, root: usize) -> Result<()> {
        if root >= self.size {
            return Err(MatmulError::Config(format!(
                "root {} outside a world of {} participants",
                root, self.size
            )));
        }
        Ok(())
    }

    fn check_layout(&self, layout: VarCount<'_>, buffer_len: usize) -> Result<()> {
        if layout.counts.len() != self.size || layout.displs.len() != self.size {
            return Err(MatmulError::Transport(format!(
                "layout describes {} participants, world has {}",
                layout.counts.len(),
                self.size
            )));
        }
        for rank in 0..self.size {
            if layout.range(rank).end > buffer_len {
                return Err(MatmulError::Transport(format!(
                    "rank {} range {:?} exceeds buffer of {} elements",
                    rank,
                    layout.range(rank),
                    buffer_len
                )));
            }
        }
        Ok(())
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scatter_varcount<T: Element>(
        &self,
        root: usize,
        send: Option<(&[T], VarCount<'_>)>,
        recv: &mut [T],
    ) -> Result<()> {
        self.check_root(root)?;

        if self.rank == root {
            let (buffer, layout) = send.ok_or_else(|| {
                MatmulError::Transport("scatter root has no send buffer".to_string())
            })?;
            self.check_layout(layout, buffer.len())?;
            for dst in 0..self.size {
                let piece = &buffer[layout.range(dst)];
                if dst == root {
                    if piece.len() != recv.len() {
                        return Err(MatmulError::Transport(format!(
                            "root expected {} elements for itself, receive buffer holds {}",
                            piece.len(),
                            recv.len()
                        )));
                    }
                    recv.copy_from_slice(piece);
                } else {
                    self.send_data(dst, piece)?;
                }
            }
            debug!(rank = self.rank, total = buffer.len(), "scattered");
        } else {
            self.recv_data(root, recv)?;
            debug!(rank = self.rank, received = recv.len(), "received scatter piece");
        }

        self.barrier()
    }

    fn broadcast<T: Element>(&self, root: usize, buf: &mut [T]) -> Result<()> {
        self.check_root(root)?;

        if self.rank == root {
            for dst in (0..self.size).filter(|&dst| dst != root) {
                self.send_data(dst, buf)?;
            }
        } else {
            self.recv_data(root, buf)?;
        }
        debug!(rank = self.rank, len = buf.len(), "broadcast complete");

        self.barrier()
    }

    fn gather_varcount<T: Element>(
        &self,
        root: usize,
        send: &[T],
        recv: Option<(&mut [T], VarCount<'_>)>,
    ) -> Result<()> {
        self.check_root(root)?;

        if self.rank == root {
            let (buffer, layout) = recv.ok_or_else(|| {
                MatmulError::Transport("gather root has no receive buffer".to_string())
            })?;
            self.check_layout(layout, buffer.len())?;
            for src in 0..self.size {
                let range = layout.range(src);
                if src == root {
                    if send.len() != range.len() {
                        return Err(MatmulError::Transport(format!(
                            "root contributes {} elements, layout expects {}",
                            send.len(),
                            range.len()
                        )));
                    }
                    buffer[range].copy_from_slice(send);
                } else {
                    self.recv_data(src, &mut buffer[range])?;
                }
            }
            debug!(rank = self.rank, total = buffer.len(), "gathered");
        } else {
            self.send_data(root, send)?;
            debug!(rank = self.rank, sent = send.len(), "sent gather piece");
        }

        self.barrier()
    }
}
