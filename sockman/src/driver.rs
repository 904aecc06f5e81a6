//! # Driver Thread and Registration Entry Points
//!
//! ## Purpose
//!
//! This file owns the lifecycle of the background driver thread and exposes the blocking
//! operations callers use to reach it from ordinary threads.
//!
//! ## How it works
//!
//! `SockMan::new` spawns a named worker thread, builds a single-threaded tokio runtime on
//! it and runs the supervisor until shutdown. The constructor returns only once the
//! runtime exists, so a start-up failure surfaces as an error instead of a dead driver.
//!
//! Callers never touch driver state. Every operation is a `Command` sent over an unbounded
//! channel; operations that need an answer carry a handoff `Responder` and the caller blocks
//! on the matching `Pending` for at most the configured handoff timeout. If the driver is
//! gone every call fails fast with `ErrorKind::NotConnected`.
//!
//! ## Main components
//!
//! - `SockMan`: owns the driver thread; dropping it requests shutdown without joining.
//! - `DriverHandle`: cloneable, `Send + Sync` access to the same driver.

use crate::config::{DRIVER_THREAD_NAME, SockManConfig};
use crate::handler::{DatagramHandler, QueueHandler};
use crate::handoff::{self, driver_gone};
use crate::queue::{self, InboundQueue};
use crate::registry::{self, Command};
use crate::stop::StopHandle;
use std::io;
use std::net::UdpSocket;
use std::thread;
use tokio::sync::mpsc;

/// Cloneable handle to a running driver.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    commands: mpsc::UnboundedSender<Command>,
    config: SockManConfig,
}

impl DriverHandle {
    /// Hands `socket` to the driver and returns the queue its datagrams arrive on.
    ///
    /// Blocks until the driver confirms the listener is installed. Every datagram that
    /// arrives after this returns is delivered to the queue in arrival order.
    ///
    /// # Errors
    ///
    /// - `NotConnected`: the driver thread is not running.
    /// - `TimedOut`: the driver did not answer within the handoff timeout.
    /// - `AlreadyExists`: the local address is registered and duplicates are rejected.
    /// - `InvalidInput`: the socket is not bound.
    pub fn start_receiving_on(&self, socket: UdpSocket) -> io::Result<(InboundQueue, StopHandle)> {
        let (tx, queue) = queue::inbound_queue();
        let stop = self.start_receiving_with(socket, QueueHandler::new(tx))?;
        Ok((queue, stop))
    }

    /// Like `start_receiving_on`, but every datagram goes to `handler` instead of a queue.
    pub fn start_receiving_with<H: DatagramHandler>(
        &self,
        socket: UdpSocket,
        handler: H,
    ) -> io::Result<StopHandle> {
        let (reply, pending) = handoff::channel();
        self.send(Command::Register {
            socket,
            handler: Box::new(handler),
            reply,
        })?;
        let registered = pending.wait(self.config.handoff_timeout_or_default())??;
        Ok(StopHandle::new(registered, self.clone()))
    }

    /// Number of registrations whose listener is still running.
    pub fn active_registrations(&self) -> io::Result<usize> {
        let (reply, pending) = handoff::channel();
        self.send(Command::Count { reply })?;
        pending.wait(self.config.handoff_timeout_or_default())
    }

    pub fn config(&self) -> &SockManConfig {
        &self.config
    }

    pub(crate) fn send(&self, command: Command) -> io::Result<()> {
        self.commands.send(command).map_err(|_| driver_gone())
    }
}

/// The background driver. Lives until `shutdown` or drop.
#[derive(Debug)]
pub struct SockMan {
    handle: DriverHandle,
    thread: Option<thread::JoinHandle<()>>,
}

impl SockMan {
    pub fn new(config: Option<SockManConfig>) -> io::Result<Self> {
        let config = config.unwrap_or_default();
        let (commands, rx) = mpsc::unbounded_channel();
        let (ready, started) = handoff::channel::<io::Result<()>>();

        let thread = thread::Builder::new()
            .name(DRIVER_THREAD_NAME.to_string())
            .spawn(move || run_driver(rx, config, ready))?;

        if let Err(e) = started.wait(config.handoff_timeout_or_default())? {
            let _ = thread.join();
            return Err(e);
        }
        log::debug!("{DRIVER_THREAD_NAME} started");

        Ok(SockMan {
            handle: DriverHandle { commands, config },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> DriverHandle {
        self.handle.clone()
    }

    /// See [`DriverHandle::start_receiving_on`].
    pub fn start_receiving_on(&self, socket: UdpSocket) -> io::Result<(InboundQueue, StopHandle)> {
        self.handle.start_receiving_on(socket)
    }

    /// See [`DriverHandle::start_receiving_with`].
    pub fn start_receiving_with<H: DatagramHandler>(
        &self,
        socket: UdpSocket,
        handler: H,
    ) -> io::Result<StopHandle> {
        self.handle.start_receiving_with(socket, handler)
    }

    pub fn active_registrations(&self) -> io::Result<usize> {
        self.handle.active_registrations()
    }

    /// Stops every registration, ends the driver loop and joins the driver thread.
    ///
    /// Handles that outlive the driver fail with `NotConnected`; their stop handles
    /// become no-ops.
    pub fn shutdown(mut self) -> io::Result<()> {
        let _ = self.handle.send(Command::Shutdown);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| io::Error::other("sockman driver thread panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for SockMan {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.handle.send(Command::Shutdown);
        }
    }
}

fn run_driver(
    commands: mpsc::UnboundedReceiver<Command>,
    config: SockManConfig,
    ready: handoff::Responder<io::Result<()>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to build driver runtime: {e}");
            let _ = ready.respond(Err(e));
            return;
        }
    };
    if ready.respond(Ok(())).is_err() {
        log::warn!("driver start-up was abandoned");
        return;
    }
    runtime.block_on(registry::supervise(commands, config));
    log::debug!("{DRIVER_THREAD_NAME} stopped");
}
