//! Durable (or in-memory) FIFO for rendered batches awaiting retry.

use crate::error::StorageError;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel path selecting [`MemoryStorage`] instead of a filesystem backend.
pub const MEMORY_PATH: &str = ":memory:";

/// Storage for batches that could not be sent because the transport was
/// unreachable. Two implementations: in-memory (lost on process exit) and
/// file-backed (one file per batch, survives a crash).
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Persist a rendered batch.
    async fn put(&self, data: Bytes) -> Result<(), StorageError>;

    /// Remove and return the oldest persisted batch.
    async fn pop(&self) -> Result<Bytes, StorageError>;

    /// Remove all persisted state.
    async fn drop_all(&self) -> Result<(), StorageError>;

    /// Whether any batch is currently persisted.
    fn is_used(&self) -> bool;
}

/// Construct a [`Storage`] backend: [`MemoryStorage`] for [`MEMORY_PATH`],
/// otherwise a [`FileStorage`] rooted at the given directory.
pub async fn new(path: &str) -> Result<Box<dyn Storage>, StorageError> {
    if path == MEMORY_PATH {
        return Ok(Box::new(MemoryStorage::new()));
    }

    Ok(Box::new(FileStorage::new(path).await?))
}

/// In-memory FIFO, guarded by a mutex.
pub struct MemoryStorage {
    queue: Mutex<VecDeque<Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, data: Bytes) -> Result<(), StorageError> {
        self.queue.lock().push_back(data);
        Ok(())
    }

    async fn pop(&self) -> Result<Bytes, StorageError> {
        self.queue.lock().pop_front().ok_or(StorageError::NoSuchData)
    }

    async fn drop_all(&self) -> Result<(), StorageError> {
        self.queue.lock().clear();
        Ok(())
    }

    fn is_used(&self) -> bool {
        !self.queue.lock().is_empty()
    }
}

/// File-backed FIFO: one file per batch under `dir`, named
/// `<base>.<nanoseconds-since-epoch>`, ordered by name (which matches
/// creation order as long as the clock is monotonic enough to not produce
/// duplicate timestamps within the process).
pub struct FileStorage {
    dir: PathBuf,
    base: String,
    count: AtomicUsize,
}

impl FileStorage {
    /// `filepath` is split into a parent directory and a base file name,
    /// e.g. `logs/app.log` becomes directory `logs` with base `app.log`.
    /// The directory is created if missing, and the file count is seeded
    /// from whatever batches already live there (crash recovery).
    pub async fn new(filepath: &str) -> Result<Self, StorageError> {
        let path = Path::new(filepath);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let base = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "app.log".to_string());

        tokio::fs::create_dir_all(&dir).await?;

        let count = Self::list_sorted(&dir).await?.len();

        Ok(Self {
            dir,
            base,
            count: AtomicUsize::new(count),
        })
    }

    async fn list_sorted(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn filename(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        self.dir.join(format!("{}.{}", self.base, nanos))
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn put(&self, data: Bytes) -> Result<(), StorageError> {
        tokio::fs::write(self.filename(), &data).await?;
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn pop(&self) -> Result<Bytes, StorageError> {
        let files = Self::list_sorted(&self.dir).await?;

        let Some(oldest) = files.into_iter().next() else {
            self.count.store(0, Ordering::Release);
            return Err(StorageError::NoSuchData);
        };

        let data = tokio::fs::read(&oldest).await?;
        tokio::fs::remove_file(&oldest).await?;
        self.count.fetch_sub(1, Ordering::AcqRel);

        Ok(Bytes::from(data))
    }

    async fn drop_all(&self) -> Result<(), StorageError> {
        tokio::fs::remove_dir_all(&self.dir).await?;
        self.count.store(0, Ordering::Release);
        Ok(())
    }

    fn is_used(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_is_fifo() {
        let storage = MemoryStorage::new();
        storage.put(Bytes::from_static(b"p1")).await.unwrap();
        storage.put(Bytes::from_static(b"p2")).await.unwrap();
        storage.put(Bytes::from_static(b"p3")).await.unwrap();

        assert_eq!(storage.pop().await.unwrap(), b"p1".to_vec());
        assert_eq!(storage.pop().await.unwrap(), b"p2".to_vec());
        assert_eq!(storage.pop().await.unwrap(), b"p3".to_vec());
    }

    #[tokio::test]
    async fn pop_on_empty_storage_errors() {
        let storage = MemoryStorage::new();
        assert!(matches!(storage.pop().await, Err(StorageError::NoSuchData)));
    }

    #[tokio::test]
    async fn drop_clears_is_used() {
        let storage = MemoryStorage::new();
        storage.put(Bytes::from_static(b"x")).await.unwrap();
        assert!(storage.is_used());

        storage.drop_all().await.unwrap();
        assert!(!storage.is_used());
    }

    #[tokio::test]
    async fn file_storage_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("app.log");
        let storage = FileStorage::new(filepath.to_str().unwrap()).await.unwrap();

        storage.put(Bytes::from_static(b"first")).await.unwrap();
        storage.put(Bytes::from_static(b"second")).await.unwrap();
        assert!(storage.is_used());

        assert_eq!(storage.pop().await.unwrap(), b"first".to_vec());
        assert_eq!(storage.pop().await.unwrap(), b"second".to_vec());
        assert!(!storage.is_used());
        assert!(matches!(storage.pop().await, Err(StorageError::NoSuchData)));
    }

    #[tokio::test]
    async fn file_storage_drop_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("app.log");
        let storage = FileStorage::new(filepath.to_str().unwrap()).await.unwrap();

        storage.put(Bytes::from_static(b"x")).await.unwrap();
        storage.drop_all().await.unwrap();

        assert!(!dir.path().exists());
    }

    #[tokio::test]
    async fn file_storage_recovers_existing_batches_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("app.log");
        {
            let storage = FileStorage::new(filepath.to_str().unwrap()).await.unwrap();
            storage.put(Bytes::from_static(b"leftover")).await.unwrap();
        }

        let storage = FileStorage::new(filepath.to_str().unwrap()).await.unwrap();
        assert!(storage.is_used());
        assert_eq!(storage.pop().await.unwrap(), b"leftover".to_vec());
    }
}
