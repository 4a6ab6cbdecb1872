//! Logging context
//!
//! A [`LogContext`] bundles one moment registry, one event bus, one stopwatch
//! and the primary logger that reports failures of the others. Tests build
//! isolated contexts; applications usually rely on [`LogContext::global`],
//! which the crate-root free functions delegate to.

use crate::config::{validate_config, EasyLoggerConfig};
use crate::core::bus::EventBus;
use crate::core::level::{LevelMask, LogLevel};
use crate::core::logger::{ErrorReport, Fallback, Logger, LoggerBuilder, LoggerHandle};
use crate::core::moments::{MomentRegistry, SystemTicks, TickSource};
use crate::core::stopwatch::{format_elapsed, Stopwatch, SystemStopwatch};
use crate::env_config::EnvConfig;
use crate::error::Result;
use crate::facade::apply_stack_config;
use crate::sinks::console::ConsoleSink;
use crate::sinks::file::FileSink;
use crate::sinks::traits::Sink;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

static GLOBAL_CONTEXT: Lazy<LogContext> = Lazy::new(LogContext::init_global);

pub struct LogContext {
    moments: MomentRegistry,
    stopwatch: Arc<dyn Stopwatch>,
    bus: Arc<EventBus>,
    fallback: Fallback,
    default_level: AtomicU8,
    primary: Mutex<Option<LoggerHandle>>,
    /// Loggers living as long as the context
    owned: Mutex<Vec<LoggerHandle>>,
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("default_level", &self.default_level())
            .field("bus", &self.bus)
            .field("moments", &self.moments)
            .finish()
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LogContext {
    /// Isolated context on system ticks and a system stopwatch, without
    /// any logger.
    pub fn new() -> Self {
        Self::with_sources(SystemTicks::new(), Arc::new(SystemStopwatch::new()))
    }

    pub fn with_sources<T: TickSource + 'static>(ticks: T, stopwatch: Arc<dyn Stopwatch>) -> Self {
        let fallback = Fallback::new();
        Self {
            moments: MomentRegistry::with_ticks(ticks),
            stopwatch,
            bus: Arc::new(EventBus::with_fallback(fallback.clone())),
            fallback,
            default_level: AtomicU8::new(LevelMask::DEBUG_AND_ABOVE.bits()),
            primary: Mutex::new(None),
            owned: Mutex::new(Vec::new()),
        }
    }

    /// Context whose primary logger (console, or file when the console is
    /// disabled) and optional file logger follow `config`.
    pub fn from_config(config: &EasyLoggerConfig) -> Result<Self> {
        validate_config(config)?;
        let level = config.level_mask()?;
        let context = Self::new();
        context.default_level.store(level.bits(), Ordering::Release);

        let styled = |builder: LoggerBuilder| {
            builder
                .tag_builder(config.tag_style.builder(context.stopwatch.clone()))
                .stacktrace_builder(config.stacktrace_style.builder())
        };

        if config.console.enabled {
            let console = ConsoleSink::new(config.console.clone());
            context.attach_primary(styled(LoggerBuilder::new(level, console)).description("console"));
        }

        if let Some(file_config) = &config.file {
            let sink = FileSink::open(file_config)?;
            let builder = styled(LoggerBuilder::new(file_config.level_mask(level)?, sink))
                .description(format!("file:{}", file_config.path.display()));
            if config.console.enabled {
                context.adopt(builder);
            } else {
                context.attach_primary(builder);
            }
        }

        Ok(context)
    }

    /// Process-wide context, created on first use from the environment
    /// (`EASY_LOGGER_CONFIG`, `EASY_LOGGER_LEVEL`). Falls back to a console
    /// logger at `DEBUG_AND_ABOVE` when the environment is unusable.
    pub fn global() -> &'static LogContext {
        &GLOBAL_CONTEXT
    }

    fn init_global() -> LogContext {
        let context = EnvConfig::load().and_then(|config| {
            apply_stack_config(&config.stack)?;
            Self::from_config(&config)
        });
        match context {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("easy_logger falls back to defaults: {}", e);
                let context = Self::new();
                context.attach_primary(
                    LoggerBuilder::new(LevelMask::DEBUG_AND_ABOVE, ConsoleSink::default())
                        .description("console"),
                );
                context
            }
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn moments(&self) -> &MomentRegistry {
        &self.moments
    }

    pub fn stopwatch(&self) -> &Arc<dyn Stopwatch> {
        &self.stopwatch
    }

    /// Builder at the default level writing to `sink`
    pub fn builder<S: Sink + 'static>(&self, sink: S) -> LoggerBuilder {
        LoggerBuilder::new(self.default_level(), sink)
    }

    /// Build a logger on this context's stopwatch and fallback and register
    /// it. The logger stays registered until the handle is dropped.
    pub fn attach(&self, builder: LoggerBuilder) -> LoggerHandle {
        let logger = builder.build_with_fallback(self.stopwatch.clone(), self.fallback.clone());
        LoggerHandle::register(Arc::new(logger), &self.bus)
    }

    /// Attach a logger for the lifetime of the context
    pub fn adopt(&self, builder: LoggerBuilder) -> Arc<Logger> {
        let handle = self.attach(builder);
        let logger = handle.logger().clone();
        let mut owned = self.owned.lock().unwrap_or_else(|e| e.into_inner());
        owned.push(handle);
        logger
    }

    /// Attach a logger that also reports the failures of every other logger,
    /// replacing (and closing) the previous primary logger.
    pub fn attach_primary(&self, builder: LoggerBuilder) -> Arc<Logger> {
        let handle = self.attach(builder);
        let logger = handle.logger().clone();
        self.fallback.set(&logger);
        let previous = {
            let mut primary = self.primary.lock().unwrap_or_else(|e| e.into_inner());
            primary.replace(handle)
        };
        drop(previous);
        logger
    }

    pub fn primary(&self) -> Option<Arc<Logger>> {
        let primary = self.primary.lock().unwrap_or_else(|e| e.into_inner());
        primary.as_ref().map(|handle| handle.logger().clone())
    }

    pub fn default_level(&self) -> LevelMask {
        LevelMask::from_bits(self.default_level.load(Ordering::Acquire))
    }

    /// Change the default level, applying it to the primary logger too.
    /// Returns the previous default.
    pub fn change_default_level(&self, level: LevelMask) -> LevelMask {
        let previous = LevelMask::from_bits(self.default_level.swap(level.bits(), Ordering::AcqRel));
        if let Some(primary) = self.primary() {
            primary.set_mask(level);
        }
        previous
    }

    // --- dispatch ---

    pub fn log(&self, level: LogLevel, details: &str) {
        self.bus.dispatch_message(level, details);
    }

    pub fn v(&self, details: &str) {
        self.log(LogLevel::Verbose, details);
    }

    pub fn d(&self, details: &str) {
        self.log(LogLevel::Debug, details);
    }

    pub fn i(&self, details: &str) {
        self.log(LogLevel::Info, details);
    }

    pub fn w(&self, details: &str) {
        self.log(LogLevel::Warn, details);
    }

    pub fn e(&self, details: &str) {
        self.log(LogLevel::Error, details);
    }

    pub fn log_fmt(&self, level: LogLevel, template: &str, args: &[&dyn Display]) {
        self.bus.dispatch_formatted(level, template, args);
    }

    pub fn v_fmt(&self, template: &str, args: &[&dyn Display]) {
        self.log_fmt(LogLevel::Verbose, template, args);
    }

    pub fn d_fmt(&self, template: &str, args: &[&dyn Display]) {
        self.log_fmt(LogLevel::Debug, template, args);
    }

    pub fn i_fmt(&self, template: &str, args: &[&dyn Display]) {
        self.log_fmt(LogLevel::Info, template, args);
    }

    pub fn w_fmt(&self, template: &str, args: &[&dyn Display]) {
        self.log_fmt(LogLevel::Warn, template, args);
    }

    pub fn e_fmt(&self, template: &str, args: &[&dyn Display]) {
        self.log_fmt(LogLevel::Error, template, args);
    }

    /// Dispatch an error; listeners add a stacktrace at `stacktrace_level`
    /// when they accept that level.
    pub fn e_error(&self, error: &(dyn Error + 'static), stacktrace_level: Option<LogLevel>) {
        self.bus
            .dispatch_exception(&ErrorReport::new(error), stacktrace_level);
    }

    pub fn e_anyhow(&self, error: &anyhow::Error, stacktrace_level: Option<LogLevel>) {
        self.bus
            .dispatch_exception(&ErrorReport::from_anyhow(error), stacktrace_level);
    }

    // --- moments ---

    #[track_caller]
    pub fn mark_moment(&self, key: Option<&str>) -> usize {
        self.moments.mark(key)
    }

    pub fn moment_keys(&self) -> BTreeSet<String> {
        self.moments.keys()
    }

    pub fn get_moments(
        &self,
        key: &str,
        predicate: Option<&dyn Fn(i64, usize) -> bool>,
    ) -> Result<Vec<i64>> {
        self.moments.get_moments(key, predicate)
    }

    pub fn get_moments_by_indexes(&self, key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
        self.moments.get_moments_by_indexes(key, indexes)
    }

    pub fn get_intervals(&self, key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
        self.moments.get_intervals(key, indexes)
    }

    // --- stopwatch ---

    pub fn elapsed_time_string(&self) -> String {
        format_elapsed(self.stopwatch.elapsed())
    }

    /// Announce the elapsed time at INFO, then restart the stopwatch.
    pub fn restart_stopwatch(&self) {
        let message = format!(
            "Restart stopwatch at {}, with time elapsed of {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.elapsed_time_string()
        );
        self.i(&message);
        self.stopwatch.restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsoleConfig, FileSinkConfig};
    use crate::sinks::memory::MemorySink;
    use crate::sinks::traits::{SinkError, SinkResult};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct ScriptedTicks {
        ticks: Vec<i64>,
        next: AtomicUsize,
    }

    impl TickSource for ScriptedTicks {
        fn now_ticks(&self) -> i64 {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.ticks[i.min(self.ticks.len() - 1)]
        }
    }

    struct ManualStopwatch(Mutex<Duration>);

    impl Stopwatch for ManualStopwatch {
        fn elapsed(&self) -> Duration {
            *self.0.lock().unwrap()
        }

        fn restart(&self) {
            *self.0.lock().unwrap() = Duration::ZERO;
        }
    }

    fn short(level: LogLevel) -> String {
        format!("[{}]", level.initial())
    }

    fn memory_builder(mask: LevelMask) -> (Arc<MemorySink>, LoggerBuilder) {
        let memory = Arc::new(MemorySink::new());
        let builder = LoggerBuilder::shared(mask, memory.clone()).tag(short);
        (memory, builder)
    }

    #[test]
    fn test_two_listeners_scenario() {
        let context = LogContext::new();
        let (debug_memory, debug) = memory_builder(LevelMask::DEBUG_AND_ABOVE);
        let (warn_memory, warn) = memory_builder(LevelMask::WARN_AND_ABOVE);
        let _debug = context.attach(debug);
        let _warn = context.attach(warn);

        context.d("details");

        assert_eq!(debug_memory.messages(), vec!["[D]: details"]);
        assert!(warn_memory.is_empty());
    }

    #[test]
    fn test_detached_logger_stops_receiving() {
        let context = LogContext::new();
        let (memory, builder) = memory_builder(LevelMask::ALL);
        let handle = context.attach(builder);
        context.i("one");
        handle.close();
        context.i("two");
        assert_eq!(memory.messages(), vec!["[I]: one"]);
        assert!(context.bus().is_empty());
    }

    #[test]
    fn test_formatted_dispatch() {
        let context = LogContext::new();
        let (memory, builder) = memory_builder(LevelMask::ALL);
        context.attach_primary(builder);

        context.w_fmt("{0} of {1} done", &[&3, &4]);
        context.i_fmt("{0} {1}", &[&"only"]);

        let messages = memory.messages();
        assert_eq!(messages[0], "[W]: 3 of 4 done");
        assert!(messages[1].starts_with("[E]: Malformed format"), "{}", messages[1]);
        assert!(messages.iter().all(|m| !m.starts_with("[I]: only")));
    }

    #[test]
    fn test_exception_dispatch_with_info_only_mask() {
        let context = LogContext::new();
        let (memory, builder) = memory_builder(LevelMask::INFO);
        let _handle = context.attach(builder);

        let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        context.e_error(&error, Some(LogLevel::Info));

        let entries = memory.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogLevel::Info);
        assert!(entries[0].1.starts_with("[I]: StackTrace\n"));
    }

    #[test]
    fn test_sink_failure_falls_back_to_primary() {
        let context = LogContext::new();
        let (primary_memory, primary) = memory_builder(LevelMask::ALL);
        context.attach_primary(primary.without_stacktrace());

        let broken = crate::sinks::from_fn(|_, _| -> SinkResult<()> {
            Err(SinkError::Generic("disk full".to_string()))
        });
        let _broken = context.attach(LoggerBuilder::new(LevelMask::ALL, broken));

        context.w("careful");

        assert_eq!(
            primary_memory.messages(),
            vec![
                "[W]: careful".to_string(),
                "[E]: Sink failure: closure: Generic error: disk full".to_string()
            ]
        );
    }

    #[test]
    fn test_change_default_level() {
        let context = LogContext::new();
        let (memory, builder) = memory_builder(LevelMask::ALL);
        context.attach_primary(builder);

        let previous = context.change_default_level(LevelMask::ERROR);
        assert_eq!(previous, LevelMask::DEBUG_AND_ABOVE);
        assert_eq!(context.default_level(), LevelMask::ERROR);
        assert_eq!(context.primary().unwrap().mask(), LevelMask::ERROR);

        context.w("hidden");
        context.e("shown");
        assert_eq!(memory.messages(), vec!["[E]: shown"]);
        assert_eq!(context.builder(MemorySink::new()).build(context.stopwatch().clone()).mask(), LevelMask::ERROR);
    }

    #[test]
    fn test_replacing_primary_closes_previous() {
        let context = LogContext::new();
        let (_, first) = memory_builder(LevelMask::ALL);
        let first = context.attach_primary(first);
        let (_, second) = memory_builder(LevelMask::ALL);
        let second = context.attach_primary(second);

        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(context.primary().unwrap().id(), second.id());
        assert_eq!(context.bus().len(), 1);
    }

    #[test]
    fn test_moment_wrappers() {
        let context = LogContext::with_sources(
            ScriptedTicks {
                ticks: vec![100, 150, 400],
                next: AtomicUsize::new(0),
            },
            Arc::new(SystemStopwatch::new()),
        );
        for expected in 1..=3 {
            assert_eq!(context.mark_moment(Some("A")), expected);
        }
        assert_eq!(context.get_moments("A", None).unwrap(), vec![100, 150, 400]);
        assert_eq!(context.get_intervals("A", None).unwrap(), vec![50, 250]);
        assert_eq!(context.get_intervals("A", Some(&[2])).unwrap(), vec![250]);
        assert_eq!(
            context.get_moments_by_indexes("A", Some(&[1])).unwrap(),
            vec![150]
        );
        assert!(context.moment_keys().contains("A"));
        assert!(context.get_moments("", None).is_err());
    }

    #[test]
    fn test_restart_stopwatch_announces_elapsed() {
        let stopwatch = Arc::new(ManualStopwatch(Mutex::new(Duration::from_millis(3_250))));
        let context = LogContext::with_sources(SystemTicks::new(), stopwatch.clone());
        let (memory, builder) = memory_builder(LevelMask::ALL);
        let _handle = context.attach(builder);

        assert_eq!(context.elapsed_time_string(), "03.250s");
        context.restart_stopwatch();

        let messages = memory.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("[I]: Restart stopwatch at "));
        assert!(messages[0].ends_with(", with time elapsed of 03.250s"));
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_from_config_with_file_primary() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        let config = EasyLoggerConfig {
            default_level: "INFO_AND_ABOVE".to_string(),
            tag_style: crate::core::builders::TagStyle::Full,
            console: ConsoleConfig {
                enabled: false,
                ..ConsoleConfig::default()
            },
            file: Some(FileSinkConfig::new(&path)),
            ..EasyLoggerConfig::default()
        };
        let context = LogContext::from_config(&config).unwrap();
        assert_eq!(context.default_level(), LevelMask::INFO_AND_ABOVE);
        assert!(context.primary().unwrap().description().starts_with("file:"));

        context.d("hidden");
        context.w("written");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[WARN]: written\n");
    }

    #[test]
    fn test_from_config_rejects_invalid_level() {
        let config = EasyLoggerConfig {
            default_level: "LOUD".to_string(),
            ..EasyLoggerConfig::default()
        };
        assert!(LogContext::from_config(&config).is_err());
    }
}
