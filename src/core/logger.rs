//! Logger instances and their message pipeline
//!
//! Every accepted message goes through the same steps: mask gate, tag
//! builder, message composer, sink. Exception logging emits the error's own
//! text at ERROR and then, behind a second independent gate, a
//! `"StackTrace\n"` message at the requested level.
//!
//! Nothing escapes a logging call. Sink errors and panics raised by a sink or
//! a builder are turned into [`EasyLogError`]s and handed to the [`Fallback`]
//! logger once; if that fails too the failure is dropped after a `tracing`
//! debug event.

use crate::core::builders::{
    compose_message, debuggable_stacktrace, formatted_tag, MessageComposer, StacktraceBuilder,
    TagBuilder, STACKTRACE_PREFIX,
};
use crate::core::bus::{EventBus, Listener};
use crate::core::level::{LevelMask, LogLevel};
use crate::core::stack::{BacktraceSource, FrameDescriptor, FrameSource};
use crate::core::stopwatch::Stopwatch;
use crate::error::{EasyLogError, Result};
use crate::sinks::traits::Sink;
use once_cell::unsync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock, Weak};

static NEXT_LOGGER_ID: AtomicU64 = AtomicU64::new(1);

/// An error being logged, with the call stack captured on first use
pub struct ErrorReport<'a> {
    error: &'a (dyn Error + 'static),
    origin: Option<&'a anyhow::Error>,
    frames: OnceCell<Vec<FrameDescriptor>>,
}

impl<'a> ErrorReport<'a> {
    pub fn new(error: &'a (dyn Error + 'static)) -> Self {
        Self {
            error,
            origin: None,
            frames: OnceCell::new(),
        }
    }

    /// Frames come from the error's own backtrace when it captured one.
    pub fn from_anyhow(error: &'a anyhow::Error) -> Self {
        let inner: &(dyn Error + 'static) = error.as_ref();
        Self {
            error: inner,
            origin: Some(error),
            frames: OnceCell::new(),
        }
    }

    /// Use `frames` instead of capturing the stack
    pub fn with_frames(self, frames: Vec<FrameDescriptor>) -> Self {
        let _ = self.frames.set(frames);
        self
    }

    pub fn error(&self) -> &(dyn Error + 'static) {
        self.error
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Unfiltered frames, newest first
    pub fn frames(&self) -> &[FrameDescriptor] {
        self.frames
            .get_or_init(|| BacktraceSource.frames(self.origin))
    }
}

impl fmt::Debug for ErrorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReport")
            .field("error", &self.message())
            .field("frames", &self.frames.get().map(Vec::len))
            .finish()
    }
}

/// Shared slot naming the logger that reports failures of other loggers
#[derive(Clone, Default)]
pub struct Fallback(Arc<RwLock<Weak<Logger>>>);

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fallback")
            .field(&self.get().map(|l| l.description().to_string()))
            .finish()
    }
}

impl Fallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, logger: &Arc<Logger>) {
        let mut slot = self.0.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::downgrade(logger);
    }

    pub fn clear(&self) {
        let mut slot = self.0.write().unwrap_or_else(|e| e.into_inner());
        *slot = Weak::new();
    }

    pub fn get(&self) -> Option<Arc<Logger>> {
        let slot = self.0.read().unwrap_or_else(|e| e.into_inner());
        slot.upgrade().filter(|logger| !logger.is_closed())
    }

    /// Log `error` with an INFO stacktrace through the fallback logger.
    /// Never fails.
    pub fn report(&self, error: &EasyLogError) {
        let Some(logger) = self.get() else {
            tracing::debug!("no fallback logger for {} failure: {}", error.category(), error);
            return;
        };
        let report = ErrorReport::new(error);
        if let Err(e) = logger.try_log_exception(&report, Some(LogLevel::Info)) {
            tracing::debug!(
                "fallback logger {} failed: {} (while reporting: {})",
                logger.description(),
                e,
                error
            );
        }
    }
}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run a builder, turning a panic into [`EasyLogError::BuilderFailure`]
fn guard<T>(what: &str, f: impl FnOnce() -> T) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        EasyLogError::builder(format!("{} panicked: {}", what, panic_message(&*payload)))
    })
}

/// Configuration of a [`Logger`]; unset hooks fall back to the standard
/// builders.
pub struct LoggerBuilder {
    mask: LevelMask,
    sink: Arc<dyn Sink>,
    tag: Option<TagBuilder>,
    composer: MessageComposer,
    stacktrace: Option<StacktraceBuilder>,
    description: Option<String>,
}

impl fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("mask", &self.mask)
            .field("sink", &self.sink.name())
            .field("stacktrace", &self.stacktrace.is_some())
            .field("description", &self.description)
            .finish()
    }
}

impl LoggerBuilder {
    pub fn new<S: Sink + 'static>(mask: LevelMask, sink: S) -> Self {
        Self::shared(mask, Arc::new(sink))
    }

    pub fn shared(mask: LevelMask, sink: Arc<dyn Sink>) -> Self {
        Self {
            mask,
            sink,
            tag: None,
            composer: Arc::new(compose_message),
            stacktrace: Some(Arc::new(debuggable_stacktrace)),
            description: None,
        }
    }

    pub fn tag<F>(self, tag: F) -> Self
    where
        F: Fn(LogLevel) -> String + Send + Sync + 'static,
    {
        self.tag_builder(Arc::new(tag))
    }

    pub fn tag_builder(mut self, tag: TagBuilder) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn composer<F>(mut self, composer: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.composer = Arc::new(composer);
        self
    }

    pub fn stacktrace<F>(self, stacktrace: F) -> Self
    where
        F: Fn(&(dyn Error + 'static), &[FrameDescriptor]) -> String + Send + Sync + 'static,
    {
        self.stacktrace_builder(Some(Arc::new(stacktrace)))
    }

    pub fn stacktrace_builder(mut self, stacktrace: Option<StacktraceBuilder>) -> Self {
        self.stacktrace = stacktrace;
        self
    }

    /// Never emit the `StackTrace` message
    pub fn without_stacktrace(self) -> Self {
        self.stacktrace_builder(None)
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Standalone logger, not registered with any bus and without fallback.
    /// The default tag builder reads `stopwatch`.
    pub fn build(self, stopwatch: Arc<dyn Stopwatch>) -> Logger {
        self.build_with_fallback(stopwatch, Fallback::new())
    }

    pub(crate) fn build_with_fallback(
        self,
        stopwatch: Arc<dyn Stopwatch>,
        fallback: Fallback,
    ) -> Logger {
        let id = NEXT_LOGGER_ID.fetch_add(1, Ordering::Relaxed);
        Logger {
            id,
            mask: AtomicU8::new(self.mask.bits()),
            sink: self.sink,
            tag: self.tag.unwrap_or_else(|| formatted_tag(stopwatch)),
            composer: self.composer,
            stacktrace: self.stacktrace,
            description: self.description.unwrap_or_else(|| format!("Log{}", id)),
            closed: AtomicBool::new(false),
            fallback,
        }
    }
}

/// A configured logger instance
pub struct Logger {
    id: u64,
    mask: AtomicU8,
    sink: Arc<dyn Sink>,
    tag: TagBuilder,
    composer: MessageComposer,
    stacktrace: Option<StacktraceBuilder>,
    description: String,
    closed: AtomicBool,
    fallback: Fallback,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("mask", &self.mask())
            .field("sink", &self.sink.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Renders the concerned-level mask
impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mask(), f)
    }
}

impl Logger {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn mask(&self) -> LevelMask {
        LevelMask::from_bits(self.mask.load(Ordering::Acquire))
    }

    /// Replace the concerned-level mask, returning the previous one.
    pub fn set_mask(&self, mask: LevelMask) -> LevelMask {
        LevelMask::from_bits(self.mask.swap(mask.bits(), Ordering::AcqRel))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop reacting to dispatched events
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("logger {} closed", self.description);
        }
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Gate, tag, compose and write.
    pub fn try_log(&self, level: LogLevel, details: &str) -> Result<()> {
        if !self.mask().matches(level) {
            return Ok(());
        }
        let tag = guard("tag builder", || (self.tag)(level))?;
        self.try_write(level, &tag, details)
    }

    /// Compose with an explicit tag and write, bypassing the gate.
    pub fn try_write(&self, level: LogLevel, tag: &str, details: &str) -> Result<()> {
        let message = guard("message composer", || (self.composer)(tag, details))?;
        match panic::catch_unwind(AssertUnwindSafe(|| self.sink.write(level, &message))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(EasyLogError::sink(format!("{}: {}", self.sink.name(), e))),
            Err(payload) => Err(EasyLogError::sink(format!(
                "{} panicked: {}",
                self.sink.name(),
                panic_message(&*payload)
            ))),
        }
    }

    /// The error's text at ERROR, then the stacktrace at `stacktrace_level`
    /// when that level passes the mask and a stacktrace builder is set.
    pub fn try_log_exception(
        &self,
        report: &ErrorReport<'_>,
        stacktrace_level: Option<LogLevel>,
    ) -> Result<()> {
        self.try_log(LogLevel::Error, &report.message())?;

        let (Some(level), Some(builder)) = (stacktrace_level, &self.stacktrace) else {
            return Ok(());
        };
        if !self.mask().matches(level) {
            return Ok(());
        }
        let trace = guard("stacktrace builder", || {
            builder(report.error(), report.frames())
        })?;
        self.try_log(level, &format!("{}{}", STACKTRACE_PREFIX, trace))
    }

    fn recover(&self, error: EasyLogError) {
        tracing::debug!(
            "logger {} failed with {} error: {}",
            self.description,
            error.category(),
            error
        );
        self.fallback.report(&error);
    }

    /// Gated log; failures go to the fallback logger.
    pub fn log(&self, level: LogLevel, details: &str) {
        if let Err(e) = self.try_log(level, details) {
            self.recover(e);
        }
    }

    /// Log with a caller-supplied tag, skipping both the gate and the tag
    /// builder.
    pub fn log_tagged(&self, level: LogLevel, tag: &str, details: &str) {
        if let Err(e) = self.try_write(level, tag, details) {
            self.recover(e);
        }
    }

    pub fn log_exception(&self, report: &ErrorReport<'_>, stacktrace_level: Option<LogLevel>) {
        if let Err(e) = self.try_log_exception(report, stacktrace_level) {
            self.recover(e);
        }
    }

    /// Build the tag for `level` and write, bypassing the gate.
    fn write_direct(&self, level: LogLevel, details: &str) {
        let result = guard("tag builder", || (self.tag)(level))
            .and_then(|tag| self.try_write(level, &tag, details));
        if let Err(e) = result {
            self.recover(e);
        }
    }

    // Direct calls on an instance always write; the mask screens dispatched
    // events and exceptions.

    pub fn v(&self, details: &str) {
        self.write_direct(LogLevel::Verbose, details);
    }

    pub fn d(&self, details: &str) {
        self.write_direct(LogLevel::Debug, details);
    }

    pub fn i(&self, details: &str) {
        self.write_direct(LogLevel::Info, details);
    }

    pub fn w(&self, details: &str) {
        self.write_direct(LogLevel::Warn, details);
    }

    pub fn e(&self, details: &str) {
        self.write_direct(LogLevel::Error, details);
    }

    pub fn e_error(&self, error: &(dyn Error + 'static), stacktrace_level: Option<LogLevel>) {
        self.log_exception(&ErrorReport::new(error), stacktrace_level);
    }

    pub fn e_anyhow(&self, error: &anyhow::Error, stacktrace_level: Option<LogLevel>) {
        self.log_exception(&ErrorReport::from_anyhow(error), stacktrace_level);
    }
}

impl Listener for Logger {
    fn on_message(&self, level: LogLevel, text: &str) {
        if !self.is_closed() {
            self.log(level, text);
        }
    }

    fn on_exception(&self, report: &ErrorReport<'_>, stacktrace_level: Option<LogLevel>) {
        if !self.is_closed() {
            self.log_exception(report, stacktrace_level);
        }
    }

    fn name(&self) -> &str {
        &self.description
    }
}

/// A logger registered with a bus. Dropping or closing the handle closes the
/// logger and removes it from the bus.
pub struct LoggerHandle {
    logger: Arc<Logger>,
    bus: Weak<EventBus>,
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("logger", &self.logger)
            .finish()
    }
}

impl LoggerHandle {
    /// Register `logger` with `bus`.
    pub fn register(logger: Arc<Logger>, bus: &Arc<EventBus>) -> Self {
        bus.register(logger.clone());
        Self {
            logger,
            bus: Arc::downgrade(bus),
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for LoggerHandle {
    fn drop(&mut self) {
        self.logger.close();
        if let Some(bus) = self.bus.upgrade() {
            let listener: Arc<dyn Listener> = self.logger.clone();
            bus.unregister(&listener);
        }
    }
}
