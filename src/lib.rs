//! logshipper: a non-blocking, in-process log-shipping client.
//!
//! A host application writes opaque byte records through a [`Writer`] (or a
//! [`BatchingWriter`] for the batched/spill-to-disk variant); the client
//! ships them to one or more remote collector endpoints over HTTP,
//! tolerating collector outages without blocking the producer.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use logshipper::{OptionsBuilder, Writer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = OptionsBuilder::new()
//!         .node_uris(vec!["http://collector.example:9200".to_string()])
//!         .build();
//!
//!     let writer = Writer::new(options)?;
//!
//!     let (n, result) = writer.write(br#"{"msg":"hello"}"#);
//!     result?;
//!     assert_eq!(n, 15);
//!
//!     writer.close().await;
//!     Ok(())
//! }
//! ```

mod batch;
mod batching_writer;
mod config;
mod error;
mod logger;
mod node;
mod pool;
mod queue;
mod signal;
mod storage;
mod transport;
mod url;
mod writer;

pub use batch::Batch;
pub use batching_writer::{BatchingWriter, BatchingWriterError};
pub use config::{Config, OptionsBuilder, Options};
pub use error::{NoAvailableServers, OptionsError, StorageError, TransportError, WriteError};
pub use logger::{Logger, SharedLogger};
pub use node::{Liveness, NodeClient};
pub use pool::{ClientsPool, PoolBuildError};
pub use queue::BoundedQueue;
pub use signal::Signal;
pub use storage::{FileStorage, MemoryStorage, Storage, MEMORY_PATH};
pub use transport::{Transport, TransportConfig};
pub use url::{parse_node_uri, split_node_uris};
pub use writer::Writer;
