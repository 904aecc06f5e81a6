#![cfg(test)]

use crate::handoff::channel;
use std::io;
use std::thread;
use std::time::Duration;

#[test]
fn test_reply_reaches_waiting_caller() {
    let (responder, pending) = channel::<u32>();
    let driver = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        responder.respond(7)
    });
    assert_eq!(pending.wait(Duration::from_secs(1)).unwrap(), 7);
    assert!(driver.join().unwrap().is_ok());
}

#[test]
fn test_reply_sent_before_wait() {
    let (responder, pending) = channel::<&'static str>();
    assert!(responder.respond("done").is_ok());
    assert_eq!(pending.wait(Duration::from_millis(10)).unwrap(), "done");
}

#[test]
fn test_timeout_returns_value_to_responder() {
    let (responder, pending) = channel::<u32>();
    let err = pending.wait(Duration::from_millis(10)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    // the caller is gone, the driver gets its value back to clean up
    assert_eq!(responder.respond(42), Err(42));
}

#[test]
fn test_dropped_responder_fails_fast() {
    let (responder, pending) = channel::<u32>();
    drop(responder);
    let err = pending.wait(Duration::from_secs(5)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);
}

#[test]
fn test_dropped_pending_rejects_reply() {
    let (responder, pending) = channel::<u32>();
    drop(pending);
    assert_eq!(responder.respond(1), Err(1));
}
