//! EasyLogger - event-driven logging facade
//!
//! Any number of loggers subscribe to one process-wide event stream. Each
//! logger screens events through its own level mask, then renders them
//! through pluggable tag, message and stacktrace builders into a sink. The
//! crate also records named timing moments and filters call stacks down to
//! the caller's own frames.
//!
//! # Quick start
//!
//! ```rust
//! use easy_logger::{LevelMask, LogContext, LoggerBuilder};
//! use easy_logger::sinks::MemorySink;
//! use std::sync::Arc;
//!
//! let context = LogContext::new();
//! let memory = Arc::new(MemorySink::new());
//! let _handle = context.attach(
//!     LoggerBuilder::shared(LevelMask::INFO_AND_ABOVE, memory.clone()).tag(|_| "[app]".into()),
//! );
//!
//! context.d("filtered out");
//! context.i("started");
//! assert_eq!(memory.messages(), vec!["[app]: started"]);
//! ```
//!
//! # Process-wide context
//!
//! ```rust,no_run
//! easy_logger::i("goes to the console");
//! easy_logger::mark_moment(Some("load"));
//! easy_logger::mark_moment(Some("load"));
//! let intervals = easy_logger::get_intervals("load", None).unwrap();
//! assert_eq!(intervals.len(), 1);
//! ```
//!
//! # Extension facade
//!
//! ```rust
//! use easy_logger::facade::{LoggerExt, Severity, SinkLogger};
//! use easy_logger::sinks::MemorySink;
//!
//! let logger = SinkLogger::new(MemorySink::new(), Severity::Info);
//! logger.debug("skipped", &[]).info("kept {0}", &[&42]);
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod env_config;
pub mod error;
pub mod facade;
pub mod sinks;

pub use config::{
    load_config_from_file, load_config_from_str, validate_config, ConsoleConfig,
    EasyLoggerConfig, FileSinkConfig, StackConfig,
};
pub use context::LogContext;
pub use env_config::EnvConfig;
pub use error::{EasyLogError, Result};

pub use core::{
    EventBus, FrameDescriptor, LevelMask, Listener, LogLevel, Logger, LoggerBuilder,
    LoggerHandle, StackFilter, StacktraceStyle, TagStyle,
};

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process-wide context
pub fn global() -> &'static LogContext {
    LogContext::global()
}

/// Attach a logger to the process-wide bus
pub fn attach(builder: LoggerBuilder) -> LoggerHandle {
    global().attach(builder)
}

/// Replace the primary logger of the process-wide context
pub fn attach_primary(builder: LoggerBuilder) -> std::sync::Arc<Logger> {
    global().attach_primary(builder)
}

pub fn change_default_level(level: LevelMask) -> LevelMask {
    global().change_default_level(level)
}

pub fn v(details: &str) {
    global().v(details);
}

pub fn d(details: &str) {
    global().d(details);
}

pub fn i(details: &str) {
    global().i(details);
}

pub fn w(details: &str) {
    global().w(details);
}

pub fn e(details: &str) {
    global().e(details);
}

pub fn v_fmt(template: &str, args: &[&dyn Display]) {
    global().v_fmt(template, args);
}

pub fn d_fmt(template: &str, args: &[&dyn Display]) {
    global().d_fmt(template, args);
}

pub fn i_fmt(template: &str, args: &[&dyn Display]) {
    global().i_fmt(template, args);
}

pub fn w_fmt(template: &str, args: &[&dyn Display]) {
    global().w_fmt(template, args);
}

pub fn e_fmt(template: &str, args: &[&dyn Display]) {
    global().e_fmt(template, args);
}

/// Log `error` at ERROR with a stacktrace at `stacktrace_level`
pub fn e_error(error: &(dyn Error + 'static), stacktrace_level: Option<LogLevel>) {
    global().e_error(error, stacktrace_level);
}

pub fn e_anyhow(error: &anyhow::Error, stacktrace_level: Option<LogLevel>) {
    global().e_anyhow(error, stacktrace_level);
}

/// Record a moment under `key`, or under the caller's location when `key`
/// is `None`. Returns the number of moments now held by that key.
#[track_caller]
pub fn mark_moment(key: Option<&str>) -> usize {
    global().mark_moment(key)
}

pub fn moment_keys() -> BTreeSet<String> {
    global().moment_keys()
}

pub fn get_moments(key: &str, predicate: Option<&dyn Fn(i64, usize) -> bool>) -> Result<Vec<i64>> {
    global().get_moments(key, predicate)
}

pub fn get_moments_by_indexes(key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
    global().get_moments_by_indexes(key, indexes)
}

pub fn get_intervals(key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
    global().get_intervals(key, indexes)
}

pub fn elapsed_time_string() -> String {
    global().elapsed_time_string()
}

pub fn restart_stopwatch() {
    global().restart_stopwatch();
}
