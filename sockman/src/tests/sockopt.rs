#![cfg(test)]

use crate::sockopt::{recv_buffer_size, set_recv_buffer_size};
use std::net::UdpSocket;

#[test]
fn test_set_recv_buffer_size() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    set_recv_buffer_size(&socket, 64 * 1024).unwrap();
    // the kernel may double or clamp the value but never goes below a sane floor
    assert!(recv_buffer_size(&socket).unwrap() >= 4096);
}

#[test]
fn test_out_of_range_size_rejected() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let err = set_recv_buffer_size(&socket, usize::MAX).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
