//! Non-batching byte sink: every `write` is forwarded to the transport as
//! its own record.

use crate::config::Options;
use crate::error::WriteError;
use crate::logger::{log_warn, SharedLogger};
use crate::pool::PoolBuildError;
use crate::queue::BoundedQueue;
use crate::transport::Transport;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// Upper bound on how long the worker waits for a reconnect signal before
/// rechecking whether the queue has since been closed. Bounds `close()`'s
/// latency when the transport never recovers.
const RECONNECT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A byte sink that queues records and ships each one independently.
///
/// Dispatch is FIFO but sends run concurrently, so delivery order across
/// successful sends is not guaranteed; a record that fails once may be
/// retried after records queued behind it.
pub struct Writer {
    queue: Arc<BoundedQueue>,
    worker: JoinHandle<()>,
}

impl Writer {
    /// Build a writer and start its background worker.
    pub fn new(options: Options) -> Result<Self, PoolBuildError> {
        let transport = Transport::new(options.transport_config(), options.logger.clone())?;
        let queue = Arc::new(BoundedQueue::new(options.queue_cap));

        let worker = tokio::spawn(Self::run(queue.clone(), transport, options.logger));

        Ok(Self { queue, worker })
    }

    /// Copy `record` and enqueue it; the caller's slice may be reused
    /// immediately after this returns. Never blocks beyond the queue's
    /// internal lock. Returns the number of bytes accepted (0 on failure)
    /// alongside the outcome.
    pub fn write(&self, record: &[u8]) -> (usize, Result<(), WriteError>) {
        let len = record.len();
        match self.queue.push(Bytes::copy_from_slice(record)) {
            Ok(()) => (len, Ok(())),
            Err(err) => (0, Err(err)),
        }
    }

    /// Close the queue, then wait for the worker to drain it and for every
    /// outstanding send it spawned to finish.
    pub async fn close(self) {
        self.queue.close();
        let _ = self.worker.await;
    }

    async fn run(queue: Arc<BoundedQueue>, transport: Arc<Transport>, logger: Option<SharedLogger>) {
        let mut sends = JoinSet::new();

        loop {
            while !transport.is_connected() && !queue.is_closed() {
                tokio::select! {
                    _ = transport.is_reconnected().recv() => break,
                    _ = tokio::time::sleep(RECONNECT_POLL_INTERVAL) => continue,
                }
            }

            let Some(record) = queue.recv().await else { break };

            // Reap finished sends opportunistically so the set doesn't grow
            // without bound under sustained throughput.
            while sends.try_join_next().is_some() {}

            let transport = transport.clone();
            let queue = queue.clone();
            let logger = logger.clone();
            sends.spawn(async move {
                if let Err(err) = transport.send(record.clone()).await {
                    log_warn!(logger, "send failed: {}; re-queueing record", err);
                    if queue.push(record).is_err() {
                        log_warn!(logger, "record dropped: queue closed or full");
                    }
                }
            });
        }

        while sends.join_next().await.is_some() {}
    }
}
