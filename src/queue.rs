//! Concurrent bounded FIFO of records, with drain-on-close semantics.

use crate::error::WriteError;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Mutex as AsyncMutex;

/// A fixed-capacity, many-producer/single-consumer FIFO.
///
/// The closed state and the channel's sending half are combined in one
/// `RwLock`: `push` takes the read side (many concurrent pushers), `close`
/// takes the write side once, which naturally blocks until every in-flight
/// push has finished its critical section before dropping the sender. A
/// dropped sender lets the receiver drain whatever was already queued, then
/// observe end-of-stream. There is no separate "in-flight" counter needed,
/// because the lock itself provides the guard the reference implementation
/// gets from a manual read-lock-then-counter discipline.
pub struct BoundedQueue {
    tx: RwLock<Option<Sender<Bytes>>>,
    rx: AsyncMutex<Receiver<Bytes>>,
}

impl BoundedQueue {
    /// Create a queue that holds at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx: RwLock::new(Some(tx)),
            rx: AsyncMutex::new(rx),
        }
    }

    /// Enqueue a record. Non-blocking: returns immediately with
    /// [`WriteError::Full`] or [`WriteError::Closed`] instead of waiting.
    pub fn push(&self, data: Bytes) -> Result<(), WriteError> {
        let guard = self.tx.read();

        match guard.as_ref() {
            None => Err(WriteError::Closed),
            Some(tx) => match tx.try_send(data) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(WriteError::Full),
                Err(TrySendError::Closed(_)) => Err(WriteError::Closed),
            },
        }
    }

    /// Pop the next record in FIFO order, or `None` once the queue has been
    /// closed and fully drained. Single-consumer: intended to be called
    /// from one worker loop at a time.
    pub async fn recv(&self) -> Option<Bytes> {
        self.rx.lock().await.recv().await
    }

    /// Idempotent. After this returns, every subsequent `push` observes
    /// [`WriteError::Closed`]; records enqueued before the call remain
    /// readable via `recv` until exhausted.
    pub fn close(&self) {
        self.tx.write().take();
    }

    /// Whether `close` has been called. Used by a worker that is waiting on
    /// something other than this queue (e.g. a reconnect signal) to decide
    /// whether it is still worth waiting.
    pub fn is_closed(&self) -> bool {
        self.tx.read().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn push_beyond_capacity_returns_full() {
        let queue = BoundedQueue::new(1);
        assert!(queue.push(Bytes::from_static(b"a")).is_ok());
        assert!(matches!(
            queue.push(Bytes::from_static(b"b")),
            Err(WriteError::Full)
        ));
    }

    #[tokio::test]
    async fn close_rejects_new_pushes_but_drains_pending() {
        let queue = BoundedQueue::new(4);
        queue.push(Bytes::from_static(b"1")).unwrap();
        queue.push(Bytes::from_static(b"2")).unwrap();

        queue.close();

        assert!(matches!(
            queue.push(Bytes::from_static(b"3")),
            Err(WriteError::Closed)
        ));
        assert_eq!(queue.recv().await, Some(Bytes::from_static(b"1")));
        assert_eq!(queue.recv().await, Some(Bytes::from_static(b"2")));
        assert_eq!(queue.recv().await, None);
    }

    #[tokio::test]
    async fn fifo_order_preserved() {
        let queue = BoundedQueue::new(8);
        for i in 0..5u8 {
            queue.push(Bytes::copy_from_slice(&[i])).unwrap();
        }

        for i in 0..5u8 {
            assert_eq!(queue.recv().await, Some(Bytes::copy_from_slice(&[i])));
        }
    }

    #[tokio::test]
    async fn concurrent_pushes_never_exceed_capacity() {
        let queue = Arc::new(BoundedQueue::new(10));
        let mut handles = Vec::new();

        for _ in 0..50 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue.push(Bytes::from_static(b"\0"))
            }));
        }

        let mut ok_count = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok_count += 1;
            }
        }

        assert!(ok_count <= 10);
    }
}
