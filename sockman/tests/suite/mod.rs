//! Shared helpers for the loopback integration tests.
#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(1);

pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn bind_loopback() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("failed to bind loopback socket");
    let addr = socket.local_addr().expect("bound socket has an address");
    (socket, addr)
}

pub fn send(to: SocketAddr, payloads: &[&[u8]]) {
    let sender = UdpSocket::bind("127.0.0.1:0").expect("failed to bind sender");
    for payload in payloads {
        sender.send_to(payload, to).expect("send_to failed");
    }
}
