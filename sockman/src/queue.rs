//! # Inbound Queue
//!
//! ## Purpose
//!
//! The consumer side of a registration. The listener on the driver thread is the only
//! producer; the thread that registered the socket is the only intended consumer.
//!
//! ## How it works
//!
//! An unbounded `crossbeam_channel` carries each payload as an owned `Vec<u8>`. FIFO
//! order is the channel's order, which is the order the listener received datagrams in.
//! When the registration is stopped the producer is dropped; messages already queued stay
//! readable, after which reads report `QueueError::Closed`.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::fmt;
use std::time::Duration;

/// Why a read from an `InboundQueue` returned no message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// Nothing is queued right now (`try_get` only).
    Empty,
    /// The wait elapsed with nothing queued (`get_timeout` only).
    Timeout,
    /// The registration is gone and every queued message has been read.
    Closed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Empty => write!(f, "inbound queue is empty"),
            QueueError::Timeout => write!(f, "timed out waiting for a datagram"),
            QueueError::Closed => write!(f, "inbound queue is closed"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Unbounded FIFO of datagram payloads received on one registered socket.
#[derive(Debug)]
pub struct InboundQueue {
    rx: Receiver<Vec<u8>>,
}

pub(crate) fn inbound_queue() -> (Sender<Vec<u8>>, InboundQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (tx, InboundQueue { rx })
}

impl InboundQueue {
    /// Blocks until a payload is available.
    pub fn get(&self) -> Result<Vec<u8>, QueueError> {
        self.rx.recv().map_err(|_| QueueError::Closed)
    }

    /// Blocks for at most `timeout` waiting for a payload.
    pub fn get_timeout(&self, timeout: Duration) -> Result<Vec<u8>, QueueError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => QueueError::Timeout,
            RecvTimeoutError::Disconnected => QueueError::Closed,
        })
    }

    /// Returns the next payload without blocking.
    pub fn try_get(&self) -> Result<Vec<u8>, QueueError> {
        self.rx.try_recv().map_err(|e| match e {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Closed,
        })
    }

    /// Drains whatever is queued right now without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
