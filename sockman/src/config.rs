//! # Driver Configuration
//!
//! `SockManConfig` follows the "everything optional" convention: every field is an
//! `Option`, `None` selects the default, and the whole struct is passed to
//! `SockMan::new` as `Option<SockManConfig>`.

use std::time::Duration;

/// How long a caller waits for the driver thread to answer a handoff.
pub const DEFAULT_HANDOFF_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest UDP payload; listeners size their receive buffer to this by default.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

pub const DRIVER_THREAD_NAME: &str = "sockman-driver";

/// What to do when a socket's local address is already registered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the new registration with `ErrorKind::AlreadyExists`.
    #[default]
    Reject,
    /// Stop the prior registration and install the new one in its place.
    Replace,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct SockManConfig {
    // bounded wait for every blocking call into the driver thread,
    // DEFAULT_HANDOFF_TIMEOUT if None
    pub handoff_timeout: Option<Duration>,
    // if None duplicate registrations are rejected
    pub duplicate: Option<DuplicatePolicy>,
    // if set, SO_RCVBUF is applied to each socket before it is handed over
    pub recv_buffer_size: Option<usize>,
    // largest payload a listener delivers, longer datagrams are dropped whole
    pub max_datagram_size: Option<usize>,
}

impl SockManConfig {
    pub fn handoff_timeout_or_default(&self) -> Duration {
        self.handoff_timeout.unwrap_or(DEFAULT_HANDOFF_TIMEOUT)
    }

    pub fn duplicate_or_default(&self) -> DuplicatePolicy {
        self.duplicate.unwrap_or_default()
    }

    pub fn max_datagram_size_or_default(&self) -> usize {
        self.max_datagram_size
            .filter(|size| *size > 0)
            .unwrap_or(MAX_DATAGRAM_SIZE)
    }
}
