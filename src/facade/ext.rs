//! Extension facade
//!
//! Implement [`LevelLogger`] (two methods) and every convenience method of
//! [`LoggerExt`] comes for free:
//!
//! ```rust
//! use easy_logger::facade::{LevelLogger, LoggerExt, Severity};
//!
//! struct Stdout;
//!
//! impl LevelLogger for Stdout {
//!     fn save(&self, message: &str) {
//!         println!("{}", message);
//!     }
//!
//!     fn bottom_level(&self) -> Severity {
//!         Severity::Info
//!     }
//! }
//!
//! Stdout
//!     .debug("dropped", &[])
//!     .info("loaded {0} rows from {1}", &[&42, &"users"]);
//! ```

use crate::config::StackConfig;
use crate::core::stack::StackFilter;
use crate::core::template::try_format;
use crate::error::Result;
use crate::facade::severity::Severity;
use crate::sinks::traits::Sink;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, RwLock};

/// Frames captured for a severity without a budget
pub const MIN_STACK_FRAME_COUNT: usize = 2;

static FRAME_BUDGETS: Lazy<RwLock<HashMap<Severity, usize>>> =
    Lazy::new(|| RwLock::new(default_frame_budgets()));

static DEFAULT_FILTER: Lazy<StackFilter> = Lazy::new(StackFilter::new);

/// Budgets in effect at start-up: the more severe, the fewer frames.
pub fn default_frame_budgets() -> HashMap<Severity, usize> {
    HashMap::from([
        (Severity::Verbose, 11),
        (Severity::Debug, 9),
        (Severity::Info, 7),
        (Severity::Warn, 5),
        (Severity::Error, 3),
        (Severity::None, 0),
    ])
}

/// Number of stack frames reported with an error logged at `severity`
pub fn frames_for(severity: Severity) -> usize {
    let budgets = FRAME_BUDGETS.read().unwrap_or_else(|e| e.into_inner());
    budgets
        .get(&severity)
        .copied()
        .unwrap_or(MIN_STACK_FRAME_COUNT)
}

/// Change the budget of `severity`, returning the previous one.
pub fn set_frame_budget(severity: Severity, frames: usize) -> Option<usize> {
    let mut budgets = FRAME_BUDGETS.write().unwrap_or_else(|e| e.into_inner());
    budgets.insert(severity, frames)
}

/// Drop the budget of `severity` so it falls back to [`MIN_STACK_FRAME_COUNT`].
pub fn clear_frame_budget(severity: Severity) -> Option<usize> {
    let mut budgets = FRAME_BUDGETS.write().unwrap_or_else(|e| e.into_inner());
    budgets.remove(&severity)
}

pub fn reset_frame_budgets() {
    let mut budgets = FRAME_BUDGETS.write().unwrap_or_else(|e| e.into_inner());
    *budgets = default_frame_budgets();
}

/// Apply the budgets listed in `config`.
pub fn apply_stack_config(config: &StackConfig) -> Result<()> {
    for (severity, frames) in config.budgets()? {
        set_frame_budget(severity, frames);
    }
    Ok(())
}

/// Minimal logger contract
pub trait LevelLogger {
    /// Persist a finished message
    fn save(&self, message: &str);

    /// Least severe level this logger records
    fn bottom_level(&self) -> Severity;

    /// Persist a finished message of a known severity
    fn save_as(&self, _level: Severity, message: &str) {
        self.save(message);
    }

    fn can_log(&self, level: Severity) -> bool {
        level >= self.bottom_level() && level != Severity::None
    }

    /// Compose the message; malformed templates yield a diagnostic instead
    /// of failing.
    fn get_message(&self, _level: Severity, template: &str, args: &[&dyn Display]) -> String {
        try_format(template, args)
    }

    fn stack_filter(&self) -> &StackFilter {
        &DEFAULT_FILTER
    }

    fn stack_indent(&self) -> char {
        ' '
    }
}

/// Convenience methods for every [`LevelLogger`]. Each returns the logger so
/// calls can be chained.
pub trait LoggerExt: LevelLogger {
    fn log(&self, level: Severity, template: &str, args: &[&dyn Display]) -> &Self {
        if self.can_log(level) {
            let message = self.get_message(level, template, args);
            self.save_as(level, &message);
        }
        self
    }

    /// Log the root cause of `error`, its outermost context when the chain
    /// has more than one link, and the filtered stack.
    fn log_error(&self, level: Severity, error: &anyhow::Error) -> &Self {
        if self.can_log(level) {
            let stack =
                self.stack_filter()
                    .capture_string(frames_for(level), Some(error), self.stack_indent());
            let message = format!("{}\n{}", describe_error(error), stack);
            let message = self.get_message(level, "{0}", &[&message]);
            self.save_as(level, &message);
        }
        self
    }

    fn verbose(&self, template: &str, args: &[&dyn Display]) -> &Self {
        self.log(Severity::Verbose, template, args)
    }

    fn debug(&self, template: &str, args: &[&dyn Display]) -> &Self {
        self.log(Severity::Debug, template, args)
    }

    fn info(&self, template: &str, args: &[&dyn Display]) -> &Self {
        self.log(Severity::Info, template, args)
    }

    fn warn(&self, template: &str, args: &[&dyn Display]) -> &Self {
        self.log(Severity::Warn, template, args)
    }

    fn error(&self, template: &str, args: &[&dyn Display]) -> &Self {
        self.log(Severity::Error, template, args)
    }

    fn verbose_error(&self, error: &anyhow::Error) -> &Self {
        self.log_error(Severity::Verbose, error)
    }

    fn debug_error(&self, error: &anyhow::Error) -> &Self {
        self.log_error(Severity::Debug, error)
    }

    fn info_error(&self, error: &anyhow::Error) -> &Self {
        self.log_error(Severity::Info, error)
    }

    fn warn_error(&self, error: &anyhow::Error) -> &Self {
        self.log_error(Severity::Warn, error)
    }

    fn error_error(&self, error: &anyhow::Error) -> &Self {
        self.log_error(Severity::Error, error)
    }
}

impl<T: LevelLogger + ?Sized> LoggerExt for T {}

/// `root` alone, or `"{outer}\nCaused by: {root}"`
pub fn describe_error(error: &anyhow::Error) -> String {
    let root = error.root_cause();
    if error.chain().count() > 1 {
        format!("{}\nCaused by: {}", error, root)
    } else {
        root.to_string()
    }
}

/// [`LevelLogger`] writing through a [`Sink`]
pub struct SinkLogger {
    sink: Arc<dyn Sink>,
    bottom: Severity,
    filter: StackFilter,
    indent: char,
}

impl fmt::Debug for SinkLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkLogger")
            .field("sink", &self.sink.name())
            .field("bottom", &self.bottom)
            .field("indent", &self.indent)
            .finish()
    }
}

impl SinkLogger {
    pub fn new<S: Sink + 'static>(sink: S, bottom: Severity) -> Self {
        Self::shared(Arc::new(sink), bottom)
    }

    pub fn shared(sink: Arc<dyn Sink>, bottom: Severity) -> Self {
        Self {
            sink,
            bottom,
            filter: StackFilter::new(),
            indent: ' ',
        }
    }

    /// Use the filters and indent of `config`.
    pub fn with_stack_config(mut self, config: &StackConfig) -> Result<Self> {
        self.filter = StackFilter::with_patterns(&config.filters)?;
        self.indent = config.indent;
        Ok(self)
    }

    pub fn with_stack_filter(mut self, filter: StackFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn set_bottom_level(&mut self, bottom: Severity) {
        self.bottom = bottom;
    }
}

impl LevelLogger for SinkLogger {
    fn save(&self, message: &str) {
        self.save_as(Severity::Info, message);
    }

    fn save_as(&self, level: Severity, message: &str) {
        let Some(level) = level.log_level() else {
            return;
        };
        if let Err(e) = self.sink.write(level, message) {
            tracing::debug!("{} sink dropped a message: {}", self.sink.name(), e);
        }
    }

    fn bottom_level(&self) -> Severity {
        self.bottom
    }

    fn stack_filter(&self) -> &StackFilter {
        &self.filter
    }

    fn stack_indent(&self) -> char {
        self.indent
    }
}
