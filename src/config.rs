//! Validated construction parameters for [`crate::writer::Writer`] and
//! [`crate::batching_writer::BatchingWriter`].
//!
//! Two coexisting surfaces, ported from two historical revisions of the
//! reference implementation: a plain [`Config`] struct with a `validate`
//! normalization step, and a functional-options [`OptionsBuilder`] for
//! callers who prefer incremental, fallible construction. Their defaults
//! differ slightly (see `SPEC_FULL.md`'s Open Question on default success
//! codes); this is intentional, not an oversight.

use crate::error::OptionsError;
use crate::logger::SharedLogger;
use crate::storage::MEMORY_PATH;
use std::time::Duration;

pub const DEFAULT_QUEUE_CAP: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_BATCH_SIZE: usize = 1024 * 1024;
pub const MINIMAL_BATCH_SIZE: usize = 512;
pub const DEFAULT_ROTATE_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_STORAGE_PATH: &str = MEMORY_PATH;

/// Plain, struct-literal configuration for a [`crate::batching_writer::BatchingWriter`].
///
/// Unset/invalid fields are normalized by [`Config::validate`] rather than
/// rejected, matching the reference's `validate()` step.
#[derive(Clone)]
pub struct Config {
    pub queue_capacity: usize,
    pub node_uris: Vec<String>,
    pub insecure: bool,
    pub request_timeout: Duration,
    pub ping_interval: Duration,
    pub success_codes: Vec<u16>,
    pub logger: Option<SharedLogger>,

    pub batch_size: usize,
    pub rotate_period: Duration,
    pub storage_path: String,
    pub drop_storage: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("queue_capacity", &self.queue_capacity)
            .field("node_uris", &self.node_uris)
            .field("insecure", &self.insecure)
            .field("request_timeout", &self.request_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("success_codes", &self.success_codes)
            .field("logger", &self.logger.is_some())
            .field("batch_size", &self.batch_size)
            .field("rotate_period", &self.rotate_period)
            .field("storage_path", &self.storage_path)
            .field("drop_storage", &self.drop_storage)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAP,
            node_uris: Vec::new(),
            insecure: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            success_codes: Vec::new(),
            logger: None,
            batch_size: DEFAULT_BATCH_SIZE,
            rotate_period: DEFAULT_ROTATE_PERIOD,
            storage_path: DEFAULT_STORAGE_PATH.to_string(),
            drop_storage: false,
        }
    }
}

impl Config {
    /// Normalize this config in place: fill defaults for zero/empty fields,
    /// clamp `batch_size` to [`MINIMAL_BATCH_SIZE`].
    pub fn validate(&mut self) {
        if self.batch_size <= MINIMAL_BATCH_SIZE {
            self.batch_size = MINIMAL_BATCH_SIZE;
        }

        if self.rotate_period.is_zero() {
            self.rotate_period = DEFAULT_ROTATE_PERIOD;
        }

        if self.request_timeout.is_zero() {
            self.request_timeout = DEFAULT_REQUEST_TIMEOUT;
        }

        if self.ping_interval.is_zero() {
            self.ping_interval = DEFAULT_PING_INTERVAL;
        }

        if self.success_codes.is_empty() {
            self.success_codes = vec![200];
        }

        if self.storage_path.is_empty() {
            self.storage_path = DEFAULT_STORAGE_PATH.to_string();
        }

        if self.queue_capacity == 0 {
            self.queue_capacity = DEFAULT_QUEUE_CAP;
        }
    }
}

/// Functional-options builder for a non-batching [`crate::writer::Writer`].
///
/// Each `with_*` method is fallible and returns immediately on an invalid
/// value, mirroring the reference's `Option` functions.
#[must_use = "builders do nothing unless you call .build()"]
pub struct OptionsBuilder {
    queue_cap: usize,
    logger: Option<SharedLogger>,
    node_uris: Vec<String>,
    insecure: bool,
    request_timeout: Duration,
    ping_interval: Duration,
    success_codes: Vec<u16>,
}

impl std::fmt::Debug for OptionsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsBuilder")
            .field("queue_cap", &self.queue_cap)
            .field("logger", &self.logger.is_some())
            .field("node_uris", &self.node_uris)
            .field("insecure", &self.insecure)
            .field("request_timeout", &self.request_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("success_codes", &self.success_codes)
            .finish()
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self {
            queue_cap: DEFAULT_QUEUE_CAP,
            logger: None,
            node_uris: Vec::new(),
            insecure: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            success_codes: vec![200, 201],
        }
    }
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_uris(mut self, uris: Vec<String>) -> Self {
        self.node_uris = uris;
        self
    }

    pub fn with_queue_cap(mut self, capacity: usize) -> Result<Self, OptionsError> {
        if capacity == 0 {
            return Err(OptionsError::BadQueueCapacity);
        }
        self.queue_cap = capacity;
        Ok(self)
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, OptionsError> {
        if timeout.is_zero() {
            return Err(OptionsError::BadRequestTimeout);
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Result<Self, OptionsError> {
        if interval.is_zero() {
            return Err(OptionsError::BadPingInterval);
        }
        self.ping_interval = interval;
        Ok(self)
    }

    pub fn with_success_codes(mut self, codes: Vec<u16>) -> Result<Self, OptionsError> {
        if codes.is_empty() {
            return Err(OptionsError::SuccessCodesEmpty);
        }
        self.success_codes = codes;
        Ok(self)
    }

    pub fn build(self) -> Options {
        Options {
            queue_cap: self.queue_cap,
            logger: self.logger,
            node_uris: self.node_uris,
            insecure: self.insecure,
            request_timeout: self.request_timeout,
            ping_interval: self.ping_interval,
            success_codes: self.success_codes,
        }
    }
}

/// Resolved options produced by [`OptionsBuilder::build`].
pub struct Options {
    pub queue_cap: usize,
    pub logger: Option<SharedLogger>,
    pub node_uris: Vec<String>,
    pub insecure: bool,
    pub request_timeout: Duration,
    pub ping_interval: Duration,
    pub success_codes: Vec<u16>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("queue_cap", &self.queue_cap)
            .field("logger", &self.logger.is_some())
            .field("node_uris", &self.node_uris)
            .field("insecure", &self.insecure)
            .field("request_timeout", &self.request_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("success_codes", &self.success_codes)
            .finish()
    }
}

impl Options {
    pub(crate) fn transport_config(&self) -> crate::transport::TransportConfig {
        crate::transport::TransportConfig {
            node_uris: self.node_uris.clone(),
            insecure: self.insecure,
            request_timeout: self.request_timeout,
            ping_interval: self.ping_interval,
            success_codes: self.success_codes.clone(),
        }
    }
}

impl Config {
    pub(crate) fn transport_config(&self) -> crate::transport::TransportConfig {
        crate::transport::TransportConfig {
            node_uris: self.node_uris.clone(),
            insecure: self.insecure,
            request_timeout: self.request_timeout,
            ping_interval: self.ping_interval,
            success_codes: self.success_codes.clone(),
        }
    }
}
