//! # Datagram Handlers and Listener Task
//!
//! ## Purpose
//!
//! This file defines what a listener does with each datagram it receives, and the
//! listener task itself.
//!
//! ## How it works
//!
//! Each registration runs one `listen` task on the driver runtime. The task waits on the
//! socket and on its cancellation token; cancellation always wins so a stopped
//! registration never delivers another datagram once the supervisor has processed the
//! stop. Every received datagram is passed to a `DatagramHandler`; one that does not fit the
//! configured maximum size is dropped instead. A handler error is
//! logged and the datagram dropped; the listener keeps going. When the task returns it
//! drops the socket, which closes the descriptor.
//!
//! ## Main components
//!
//! - `DatagramHandler`: the "message received" capability, implemented for closures.
//! - `QueueHandler`: forwards payloads into an `InboundQueue`.
//! - `listen()`: the per-registration receive loop.

use crossbeam_channel::Sender;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Receives every datagram that arrives on a registered socket.
///
/// Handlers run on the driver thread, so they must not block. An error returned from
/// `datagram_received` drops that one datagram; the registration stays active.
///
/// # Example
///
/// ```rust
/// use std::io;
/// use std::net::{SocketAddr, UdpSocket};
///
/// # fn main() -> std::io::Result<()> {
/// let sockman = sockman::SockMan::new(None)?;
/// let socket = UdpSocket::bind("127.0.0.1:0")?;
/// let stop = sockman.start_receiving_with(socket, |data: &[u8], from: SocketAddr| -> io::Result<()> {
///     log::info!("{} bytes from {from}", data.len());
///     Ok(())
/// })?;
/// stop.stop();
/// # Ok(())
/// # }
/// ```
pub trait DatagramHandler: Send + 'static {
    fn datagram_received(&mut self, data: &[u8], from: SocketAddr) -> io::Result<()>;
}

impl<F> DatagramHandler for F
where
    F: FnMut(&[u8], SocketAddr) -> io::Result<()> + Send + 'static,
{
    fn datagram_received(&mut self, data: &[u8], from: SocketAddr) -> io::Result<()> {
        self(data, from)
    }
}

/// Pushes payloads onto the producer side of an `InboundQueue`.
///
/// The sender address is not forwarded; consumers that need it register their own
/// handler with `start_receiving_with`.
pub(crate) struct QueueHandler {
    tx: Sender<Vec<u8>>,
}

impl QueueHandler {
    pub fn new(tx: Sender<Vec<u8>>) -> Self {
        QueueHandler { tx }
    }
}

impl DatagramHandler for QueueHandler {
    fn datagram_received(&mut self, data: &[u8], _from: SocketAddr) -> io::Result<()> {
        self.tx
            .send(data.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "inbound queue was dropped"))
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Receive loop for one registration, runs until `token` is cancelled.
///
/// Datagrams longer than `max_datagram_size` are dropped whole, never truncated.
pub(crate) async fn listen(
    socket: UdpSocket,
    mut handler: Box<dyn DatagramHandler>,
    token: CancellationToken,
    local_addr: SocketAddr,
    max_datagram_size: usize,
) {
    // one spare byte tells a full-size datagram apart from a truncated one
    let mut buf = vec![0u8; max_datagram_size + 1];
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, from)) if len > max_datagram_size => {
                        log::warn!(
                            "dropped datagram from {from} on {local_addr}: larger than {max_datagram_size} bytes"
                        );
                    }
                    Ok((len, from)) => {
                        if let Err(e) = handler.datagram_received(&buf[..len], from) {
                            log::warn!("dropped datagram from {from} on {local_addr}: {e}");
                        }
                    }
                    Err(e) if is_transient(&e) => {
                        log::debug!("transient receive error on {local_addr}: {e}");
                    }
                    Err(e) => {
                        log::error!("receive failed on {local_addr}, listener exits: {e}");
                        break;
                    }
                }
            }
        }
    }
    log::debug!("listener on {local_addr} closed");
}
