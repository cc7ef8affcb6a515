//! Pluggable diagnostic sink.
//!
//! The client never requires a [`Logger`]. Every call site that would log
//! through one also emits a `tracing` event, so operators get structured
//! diagnostics whether or not they wire one up. A `Logger` is for hosts that
//! want these specific messages routed into their own logging pipeline
//! without standing up a `tracing` subscriber.

use std::fmt;
use std::sync::Arc;

/// A sink accepting pre-formatted diagnostic messages.
///
/// Unlike the `Printf`-style interface this mirrors, Rust has no variadic
/// interfaces, so callers format with [`format!`] before calling
/// [`Logger::log`].
pub trait Logger: Send + Sync {
    fn log(&self, message: fmt::Arguments<'_>);
}

impl<F> Logger for F
where
    F: Fn(fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, message: fmt::Arguments<'_>) {
        (self)(message)
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Log to both the optional [`Logger`] and a `tracing::warn!` event.
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {{
        tracing::warn!($($arg)*);
        if let Some(logger) = $logger.as_ref() {
            logger.log(format_args!($($arg)*));
        }
    }};
}

pub(crate) use log_warn;
