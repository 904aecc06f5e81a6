#![cfg(test)]

use crate::queue::{QueueError, inbound_queue};
use std::time::Duration;

#[test]
fn test_fifo_order() {
    let (tx, queue) = inbound_queue();
    for i in 0..10u8 {
        tx.send(vec![i; 3]).unwrap();
    }
    assert_eq!(queue.len(), 10);
    for i in 0..10u8 {
        assert_eq!(queue.get().unwrap(), vec![i; 3]);
    }
    assert!(queue.is_empty());
}

#[test]
fn test_empty_is_distinct_from_closed() {
    let (tx, queue) = inbound_queue();
    assert_eq!(queue.try_get(), Err(QueueError::Empty));
    assert_eq!(
        queue.get_timeout(Duration::from_millis(10)),
        Err(QueueError::Timeout)
    );
    drop(tx);
    assert_eq!(queue.try_get(), Err(QueueError::Closed));
    assert_eq!(queue.get(), Err(QueueError::Closed));
}

#[test]
fn test_messages_survive_producer_drop() {
    let (tx, queue) = inbound_queue();
    tx.send(b"one".to_vec()).unwrap();
    tx.send(b"two".to_vec()).unwrap();
    drop(tx);
    assert_eq!(queue.try_iter().collect::<Vec<_>>(), vec![b"one".to_vec(), b"two".to_vec()]);
    assert_eq!(
        queue.get_timeout(Duration::from_millis(10)),
        Err(QueueError::Closed)
    );
}
