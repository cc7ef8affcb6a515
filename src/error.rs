//! Error types for the log-shipping client.

use thiserror::Error;

/// Error returned by [`crate::writer::Writer::write`] and
/// [`crate::batching_writer::BatchingWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The bounded queue was at capacity; the record was not accepted.
    #[error("write failed: queue is full")]
    Full,

    /// The sink has been closed; the record was not accepted.
    #[error("write failed: queue is closed")]
    Closed,
}

/// Error returned by [`crate::transport::Transport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Every node in the pool is currently marked dead.
    #[error("no available clients")]
    NoAvailableClients,
}

impl TransportError {
    /// Whether a caller should expect this failure to clear on its own once
    /// a node recovers, rather than treating it as fatal. `NoAvailableClients`
    /// is the only send-time error and is always transient; it is exactly
    /// the condition the non-batching worker's re-enqueue path and the
    /// batching path's spill-to-storage path are built to ride out.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::NoAvailableClients => true,
        }
    }
}

/// Error returned when constructing a [`crate::pool::ClientsPool`] or
/// [`crate::transport::Transport`] with no configured endpoints.
#[derive(Debug, Clone, Copy, Error)]
#[error("no available servers for connection")]
pub struct NoAvailableServers;

/// Error returned by [`crate::config::OptionsBuilder`] methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("queue capacity invalid")]
    BadQueueCapacity,

    #[error("request timeout invalid")]
    BadRequestTimeout,

    #[error("ping interval invalid")]
    BadPingInterval,

    #[error("success codes empty")]
    SuccessCodesEmpty,
}

/// Error returned by [`crate::storage::Storage`] operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `pop()` was called on an empty store.
    #[error("no such data")]
    NoSuchData,

    /// Underlying filesystem operation failed (file-backed storage only).
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_available_clients_is_retryable() {
        assert!(TransportError::NoAvailableClients.is_retryable());
    }
}
