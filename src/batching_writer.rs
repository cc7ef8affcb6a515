//! Batching byte sink: aggregates records into size/time-bounded batches and
//! spills them to [`Storage`] when the transport is unreachable.

use crate::batch::Batch;
use crate::config::Config;
use crate::error::WriteError;
use crate::logger::{log_warn, SharedLogger};
use crate::pool::PoolBuildError;
use crate::signal::Signal;
use crate::storage::{self, Storage};
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// Reuses `Batch` allocations across rotations instead of reallocating a
/// fresh buffer every time the current batch is released.
struct BatchPool {
    capacity: usize,
    free: Mutex<Vec<Batch>>,
}

impl BatchPool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: Mutex::new(Vec::new()),
        }
    }

    fn acquire(&self) -> Batch {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| Batch::new(self.capacity))
    }

    fn release(&self, mut batch: Batch) {
        batch.reset();
        self.free.lock().push(batch);
    }
}

struct Shared {
    current: Mutex<Batch>,
    pool: BatchPool,
    transport: Arc<Transport>,
    storage: Arc<dyn Storage>,
    batch_size: usize,
    releasing: AtomicBool,
    logger: Option<SharedLogger>,
    drop_storage: bool,
    tasks: Mutex<JoinSet<()>>,
}

impl Shared {
    /// Swap out the current batch for a fresh one and spawn a task to
    /// release it, unless it has nothing in it.
    fn rotate(self: &Arc<Self>) {
        let filled = {
            let mut current = self.current.lock();
            if current.is_empty() {
                return;
            }
            std::mem::replace(&mut *current, self.pool.acquire())
        };

        let shared = Arc::clone(self);
        shared.tasks.lock().spawn(async move {
            shared.release_batch(filled).await;
        });
    }

    async fn release_batch(self: Arc<Self>, batch: Batch) {
        let rendered = batch.bytes();

        if self.transport.is_connected() && self.transport.send(rendered.clone()).await.is_ok() {
            self.pool.release(batch);
            return;
        }

        if let Err(err) = self.storage.put(rendered).await {
            log_warn!(self.logger, "failed to spill batch to storage: {}", err);
        }
        self.pool.release(batch);
    }

    /// Drain storage while the transport is connected. Guarded so only one
    /// drainer runs at a time; concurrent callers are no-ops.
    fn spawn_release_storage(self: &Arc<Self>) {
        if self
            .releasing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let shared = Arc::clone(self);
        shared.tasks.lock().spawn(async move {
            while shared.transport.is_connected() && shared.storage.is_used() {
                let batch = match shared.storage.pop().await {
                    Ok(batch) => batch,
                    Err(_) => break,
                };

                if shared.transport.send(batch.clone()).await.is_ok() {
                    continue;
                }

                if let Err(err) = shared.storage.put(batch).await {
                    log_warn!(shared.logger, "failed to put batch back into storage: {}", err);
                    break;
                }
            }

            shared.releasing.store(false, Ordering::Release);
        });
    }
}

/// A byte sink that aggregates writes into batches, flushing on size or a
/// rotation timer, and persisting unsent batches to disk or memory.
pub struct BatchingWriter {
    shared: Arc<Shared>,
    done: Signal,
    worker: JoinHandle<()>,
}

impl BatchingWriter {
    /// Build a batching writer, its storage backend, and start its
    /// background worker.
    pub async fn new(mut config: Config) -> Result<Self, BatchingWriterError> {
        config.validate();

        let transport = Transport::new(config.transport_config(), config.logger.clone())
            .map_err(BatchingWriterError::Pool)?;
        let storage = storage::new(&config.storage_path)
            .await
            .map_err(BatchingWriterError::Storage)?;
        let storage: Arc<dyn Storage> = Arc::from(storage);

        let pool = BatchPool::new(config.batch_size);
        let current = Mutex::new(pool.acquire());

        let shared = Arc::new(Shared {
            current,
            pool,
            transport,
            storage,
            batch_size: config.batch_size,
            releasing: AtomicBool::new(false),
            logger: config.logger.clone(),
            drop_storage: config.drop_storage,
            tasks: Mutex::new(JoinSet::new()),
        });

        let done = Signal::new();
        let worker = tokio::spawn(Self::run(shared.clone(), done.clone(), config.rotate_period));

        Ok(Self { shared, done, worker })
    }

    /// Append `data` to the current batch, rotating first if it would not
    /// fit. Always succeeds; never blocks beyond the batch mutex. The result
    /// half of the return mirrors the non-batching [`crate::writer::Writer::write`]
    /// byte-sink shape and is always `Ok`, since this path has no queue to
    /// reject the write.
    pub fn write(&self, data: &[u8]) -> (usize, Result<(), WriteError>) {
        let len = data.len();

        let should_rotate = {
            let current = self.shared.current.lock();
            !current.is_empty() && current.len() + len + 1 > self.shared.batch_size
        };

        if should_rotate {
            self.shared.rotate();
        }

        self.shared.current.lock().append(data);
        (len, Ok(()))
    }

    /// Force rotation of the current batch regardless of size.
    pub fn sync(&self) {
        self.shared.rotate();
    }

    /// Signal the worker to stop, flush the final batch, drain storage once,
    /// and wait for every background task to finish. Optionally removes
    /// persisted storage state.
    pub async fn close(self) {
        self.done.send();
        let _ = self.worker.await;

        self.shared.rotate();
        self.shared.spawn_release_storage();

        let mut tasks = std::mem::take(&mut *self.shared.tasks.lock());
        while tasks.join_next().await.is_some() {}

        if self.shared.drop_storage {
            if let Err(err) = self.shared.storage.drop_all().await {
                log_warn!(self.shared.logger, "failed to drop storage: {}", err);
            }
        }
    }

    async fn run(shared: Arc<Shared>, done: Signal, rotate_period: Duration) {
        let mut ticker = tokio::time::interval(rotate_period);
        ticker.tick().await; // first tick fires immediately; consume it up front

        let reconnected = shared.transport.is_reconnected();

        loop {
            tokio::select! {
                _ = reconnected.recv() => shared.spawn_release_storage(),
                _ = ticker.tick() => shared.rotate(),
                _ = done.recv() => break,
            }
        }
    }
}

/// Error constructing a [`BatchingWriter`].
#[derive(Debug, thiserror::Error)]
pub enum BatchingWriterError {
    #[error(transparent)]
    Pool(#[from] PoolBuildError),
    #[error(transparent)]
    Storage(#[from] crate::error::StorageError),
}
