//! # sockman - UDP Receive Bridge for Synchronous Callers
//!
//! ## Purpose
//!
//! This crate lets ordinary threads receive UDP datagrams from any number of sockets
//! without running an event loop themselves. A single background worker thread owns
//! a tokio driver; callers hand it already-bound sockets and get back a per-socket
//! inbound queue and a stop handle.
//!
//! ## How it works
//!
//! - `SockMan::new` spawns the worker thread and starts a single-threaded tokio runtime
//!   on it. A supervisor task on that runtime owns the registration table.
//! - `start_receiving_on` sends a registration command to the supervisor and blocks the
//!   calling thread (with a bounded wait) until the listener is installed.
//! - Every listener forwards received payloads into its `InboundQueue`.
//! - `StopHandle::stop` asks the supervisor to cancel the listener and close the socket.
//!   All mutation of the registration table happens on the driver thread.
//!
//! ## Main components
//!
//! - `SockMan`, `DriverHandle`: driver lifecycle and the cross-thread entry points.
//! - `InboundQueue`, `QueueError`: the consumer side of a registration.
//! - `StopHandle`: idempotent teardown of one registration.
//! - `DatagramHandler`: the per-datagram callback a listener invokes.
//! - `SockManConfig`, `DuplicatePolicy`: driver configuration.
//!
//! ## Example
//!
//! ```rust
//! use std::net::UdpSocket;
//! use std::time::Duration;
//!
//! # fn main() -> std::io::Result<()> {
//! let sockman = sockman::SockMan::new(None)?;
//! let socket = UdpSocket::bind("127.0.0.1:0")?;
//! let addr = socket.local_addr()?;
//! let (queue, stop) = sockman.start_receiving_on(socket)?;
//!
//! UdpSocket::bind("127.0.0.1:0")?.send_to(b"ping", addr)?;
//! assert_eq!(queue.get_timeout(Duration::from_secs(1)).ok(), Some(b"ping".to_vec()));
//!
//! stop.stop();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod handler;
pub mod queue;
pub mod stop;

#[doc(hidden)]
pub mod sockopt;

mod handoff;
mod registry;

pub use config::{DuplicatePolicy, SockManConfig};
pub use driver::{DriverHandle, SockMan};
pub use handler::DatagramHandler;
pub use queue::{InboundQueue, QueueError};
pub use stop::StopHandle;

#[cfg(test)]
mod tests;
