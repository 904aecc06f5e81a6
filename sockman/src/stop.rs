//! # Stop Handle
//!
//! A `StopHandle` names exactly one registration (its id and local address) and the driver
//! that owns it. Stopping only ever sends a request to the driver; the socket is closed on
//! the driver thread, never on the caller's.

use crate::driver::DriverHandle;
use crate::handoff;
use crate::registry::{Command, Registered};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Requests teardown of one registration. Cheap to clone, callable from any thread.
///
/// Clones share one "stop requested" flag, so however many times and from however many
/// threads `stop` is called, the driver receives a single request. Payloads already in the
/// `InboundQueue` remain readable after a stop.
#[derive(Clone, Debug)]
pub struct StopHandle {
    registered: Registered,
    driver: DriverHandle,
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub(crate) fn new(registered: Registered, driver: DriverHandle) -> Self {
        StopHandle {
            registered,
            driver,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Schedules the stop on the driver and returns immediately.
    ///
    /// A datagram being delivered concurrently is either queued or dropped. Use
    /// `stop_and_wait` when the socket must be closed before continuing.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let command = Command::Stop {
            registered: self.registered,
            done: None,
        };
        if self.driver.send(command).is_err() {
            log::debug!(
                "driver already gone, registration on {} is closed",
                self.registered.local_addr
            );
        }
    }

    /// Stops the registration and blocks until the driver has closed the socket.
    ///
    /// Safe to call after `stop` or repeatedly; later calls only wait for the first
    /// request to complete. Returns `Ok` if the driver has already shut down, since
    /// shutdown closes every socket.
    ///
    /// # Errors
    ///
    /// `TimedOut` if the driver does not confirm within the handoff timeout.
    pub fn stop_and_wait(&self) -> io::Result<()> {
        self.stopped.store(true, Ordering::Release);
        let (done, pending) = handoff::channel();
        let command = Command::Stop {
            registered: self.registered,
            done: Some(done),
        };
        if self.driver.send(command).is_err() {
            return Ok(());
        }
        match pending.wait(self.driver.config().handoff_timeout_or_default()) {
            // request was discarded by a shutdown that already closed the socket
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }

    /// Whether a stop has been requested through this handle or one of its clones.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Local address of the registered socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.registered.local_addr
    }
}
