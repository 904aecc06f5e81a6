//! # Registration Table and Supervisor
//!
//! ## Purpose
//!
//! The driver-side half of the bridge. One supervisor task runs on the driver runtime for
//! its whole life, consumes `Command`s sent from arbitrary threads and owns the table of
//! active registrations. Because only this task touches the table, no locking is needed.
//!
//! ## How it works
//!
//! - `Register` validates the socket, resolves duplicates, converts it to a tokio socket
//!   and spawns a `listen` task with a child of the supervisor's cancellation token.
//!   The result goes back through the request's own `Responder`; if the caller already
//!   gave up waiting the new registration is torn down straight away.
//! - `Stop` cancels the listener, waits for the task to finish (so the socket is closed)
//!   and removes the entry. Stopping an unknown or replaced registration is a no-op.
//! - `Count` reports registrations whose listener is still running.
//! - `Shutdown`, or every sender going away, cancels the root token and drains the table.
//!
//! ## Main components
//!
//! - `Command`: requests injected from other threads.
//! - `Registry`: the registration table.
//! - `supervise()`: the command loop.

use crate::config::{DuplicatePolicy, SockManConfig};
use crate::handler::{DatagramHandler, listen};
use crate::handoff::Responder;
use crate::sockopt;
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) enum Command {
    Register {
        socket: StdUdpSocket,
        handler: Box<dyn DatagramHandler>,
        reply: Responder<io::Result<Registered>>,
    },
    Stop {
        registered: Registered,
        done: Option<Responder<()>>,
    },
    Count {
        reply: Responder<usize>,
    },
    Shutdown,
}

/// Identifies one registration; ids are never reused within a driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Registered {
    pub id: u64,
    pub local_addr: SocketAddr,
}

struct Registration {
    id: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Registration {
    async fn close(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                log::warn!("listener for registration {} panicked", self.id);
            }
        }
    }
}

pub(crate) struct Registry {
    entries: HashMap<SocketAddr, Registration>,
    root: CancellationToken,
    next_id: u64,
    config: SockManConfig,
}

impl Registry {
    pub fn new(config: SockManConfig) -> Self {
        Registry {
            entries: HashMap::new(),
            root: CancellationToken::new(),
            next_id: 1,
            config,
        }
    }

    /// Installs a listener for `socket`. Must run inside the driver runtime.
    pub async fn register(
        &mut self,
        socket: StdUdpSocket,
        handler: Box<dyn DatagramHandler>,
    ) -> io::Result<Registered> {
        let local_addr = socket.local_addr().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("socket has no local address: {e}"),
            )
        })?;
        if local_addr.port() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "socket must be bound before registration",
            ));
        }

        match self.entries.get(&local_addr).map(|r| r.task.is_finished()) {
            None => {}
            // listener died (receive error or handler panic), the entry only waits for a stop
            Some(true) => self.remove(local_addr).await,
            Some(false) => match self.config.duplicate_or_default() {
                DuplicatePolicy::Reject => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{local_addr} is already registered"),
                    ));
                }
                DuplicatePolicy::Replace => {
                    log::debug!("replacing registration on {local_addr}");
                    self.remove(local_addr).await;
                }
            },
        }

        if let Some(size) = self.config.recv_buffer_size {
            sockopt::set_recv_buffer_size(&socket, size)?;
        }
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket)?;

        let id = self.next_id;
        self.next_id += 1;
        let token = self.root.child_token();
        let task = tokio::spawn(listen(
            socket,
            handler,
            token.clone(),
            local_addr,
            self.config.max_datagram_size_or_default(),
        ));
        self.entries
            .insert(local_addr, Registration { id, token, task });
        log::debug!("registration {id} listening on {local_addr}");
        Ok(Registered { id, local_addr })
    }

    /// Returns `false` if `registered` is not (or no longer) active.
    pub async fn stop(&mut self, registered: Registered) -> bool {
        match self.entries.get(&registered.local_addr) {
            Some(r) if r.id == registered.id => {}
            _ => return false,
        }
        self.remove(registered.local_addr).await;
        log::debug!(
            "registration {} on {} stopped",
            registered.id,
            registered.local_addr
        );
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registrations whose listener is still running. An entry whose listener exited
    /// (receive error, handler panic) stays in the table until it is stopped or replaced.
    pub fn live(&self) -> usize {
        self.entries
            .values()
            .filter(|r| !r.task.is_finished())
            .count()
    }

    pub async fn shutdown(&mut self) {
        self.root.cancel();
        for (_, registration) in self.entries.drain() {
            registration.close().await;
        }
    }

    async fn remove(&mut self, local_addr: SocketAddr) {
        if let Some(registration) = self.entries.remove(&local_addr) {
            registration.close().await;
        }
    }
}

pub(crate) async fn supervise(mut commands: UnboundedReceiver<Command>, config: SockManConfig) {
    let mut registry = Registry::new(config);
    while let Some(command) = commands.recv().await {
        match command {
            Command::Register {
                socket,
                handler,
                reply,
            } => {
                let result = registry.register(socket, handler).await;
                if let Err(Ok(orphan)) = reply.respond(result) {
                    log::warn!(
                        "registration {} on {} was abandoned by its caller",
                        orphan.id,
                        orphan.local_addr
                    );
                    registry.stop(orphan).await;
                }
            }
            Command::Stop { registered, done } => {
                registry.stop(registered).await;
                if let Some(done) = done {
                    let _ = done.respond(());
                }
            }
            Command::Count { reply } => {
                let _ = reply.respond(registry.live());
            }
            Command::Shutdown => break,
        }
    }
    log::debug!(
        "supervisor shutting down with {} active registrations",
        registry.len()
    );
    registry.shutdown().await;
}
