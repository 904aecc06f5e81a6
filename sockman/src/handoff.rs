//! # Cross-Thread Handoff
//!
//! A one-shot reply slot shared by a blocked caller thread (`Pending`) and the driver
//! thread (`Responder`). The caller waits with a bound; if the bound elapses the caller
//! and the driver race on a single state word, so exactly one of them decides the
//! outcome:
//!
//! - the driver wins: the caller keeps waiting, the reply is already on its way;
//! - the caller wins: `respond` hands the value back to the driver, which then owns
//!   the cleanup (e.g. tears down a registration nobody will ever see).

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

const PENDING: u8 = 0;
const ANSWERED: u8 = 1;
const ABANDONED: u8 = 2;

pub(crate) fn channel<T>() -> (Responder<T>, Pending<T>) {
    let state = Arc::new(AtomicU8::new(PENDING));
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        Responder {
            state: state.clone(),
            tx,
        },
        Pending { state, rx },
    )
}

pub(crate) fn driver_gone() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "sockman driver is not running")
}

pub(crate) struct Responder<T> {
    state: Arc<AtomicU8>,
    tx: Sender<T>,
}

impl<T> Responder<T> {
    /// Delivers `value`, or gives it back if the caller already stopped waiting.
    pub fn respond(self, value: T) -> Result<(), T> {
        if self
            .state
            .compare_exchange(PENDING, ANSWERED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(value);
        }
        self.tx.send(value).map_err(|e| e.into_inner())
    }
}

pub(crate) struct Pending<T> {
    state: Arc<AtomicU8>,
    rx: Receiver<T>,
}

impl<T> Pending<T> {
    /// Blocks until the driver replies, the driver goes away, or `timeout` elapses.
    ///
    /// # Returns
    ///
    /// The reply, `ErrorKind::NotConnected` if the responder was dropped unanswered,
    /// or `ErrorKind::TimedOut` if the caller won the race after the bound elapsed.
    pub fn wait(self, timeout: Duration) -> io::Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Disconnected) => Err(driver_gone()),
            Err(RecvTimeoutError::Timeout) => {
                if self
                    .state
                    .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("sockman driver did not answer within {timeout:?}"),
                    ))
                } else {
                    // answered just as the wait expired, the send is already in flight
                    self.rx.recv().map_err(|_| driver_gone())
                }
            }
        }
    }
}
