//! # Socket Option Helpers
//!
//! Thin `libc` wrappers for the receive-buffer option applied to registered sockets
//! when `SockManConfig::recv_buffer_size` is set.

use std::io;
use std::mem::size_of;
use std::os::fd::AsRawFd;

/// Sets `SO_RCVBUF`. The kernel may round the value (Linux doubles it).
pub fn set_recv_buffer_size(socket: &impl AsRawFd, size: usize) -> io::Result<()> {
    let value = libc::c_int::try_from(size).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("receive buffer size {size} is out of range"),
        )
    })?;
    if unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &value as *const _ as *const libc::c_void,
            size_of::<libc::c_int>() as libc::socklen_t,
        ) < 0
    } {
        return Err(io::Error::other(format!(
            "Failed to set SO_RCVBUF: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

pub fn recv_buffer_size(socket: &impl AsRawFd) -> io::Result<usize> {
    let mut value: libc::c_int = 0;
    let mut optlen = size_of::<libc::c_int>() as libc::socklen_t;
    unsafe {
        if libc::getsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &mut value as *mut _ as *mut libc::c_void,
            &mut optlen,
        ) < 0
        {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(value as usize)
}
