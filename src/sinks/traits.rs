//! Sink traits
//!
//! A sink is the final consumer of a composed message. Loggers hand every
//! accepted message to exactly one sink.
//!
//! # Usage
//!
//! ```rust
//! use easy_logger::sinks::traits::{Sink, SinkResult};
//! use easy_logger::LogLevel;
//!
//! #[derive(Debug, Default)]
//! struct CountingSink {
//!     count: std::sync::atomic::AtomicUsize,
//! }
//!
//! impl Sink for CountingSink {
//!     fn write(&self, _level: LogLevel, _message: &str) -> SinkResult<()> {
//!         self.count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "counting"
//!     }
//! }
//! ```

use crate::core::level::LogLevel;

/// Output target of a logger
pub trait Sink: Send + Sync {
    /// Persist one composed message
    fn write(&self, level: LogLevel, message: &str) -> SinkResult<()>;

    /// Push buffered output to its destination
    fn flush(&self) -> SinkResult<()> {
        Ok(())
    }

    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Short status line for diagnostics
    fn stats(&self) -> String {
        format!("Sink: {}", self.name())
    }
}

impl<F> Sink for F
where
    F: Fn(LogLevel, &str) -> SinkResult<()> + Send + Sync,
{
    fn write(&self, level: LogLevel, message: &str) -> SinkResult<()> {
        self(level, message)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Wrap a closure as a sink. Unlike passing the closure directly, this lets
/// the compiler infer the closure's argument types.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(LogLevel, &str) -> SinkResult<()> + Send + Sync,
{
    f
}

/// Sink error type
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),

    /// Sink already closed
    #[error("Sink is closed")]
    Closed,
}

/// Sink result type
pub type SinkResult<T> = Result<T, SinkError>;
