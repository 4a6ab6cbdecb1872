//! Pluggable tag, message and stacktrace builders
//!
//! A logger composes every message from three hooks. Each has a standard
//! implementation here; loggers fall back to them when a hook is left unset.

use crate::core::level::LogLevel;
use crate::core::stack::{is_facade_frame, FrameDescriptor};
use crate::core::stopwatch::{format_elapsed, Stopwatch};
use serde::Deserialize;
use std::error::Error;
use std::fmt::Write;
use std::sync::Arc;

pub const SPACE_BEFORE_TAG: &str = "  ";
pub const TAG_MESSAGE_CONNECTOR: &str = ": ";
pub const STACKTRACE_PREFIX: &str = "StackTrace\n";

/// Level -> tag
pub type TagBuilder = Arc<dyn Fn(LogLevel) -> String + Send + Sync>;

/// (tag, details) -> final message
pub type MessageComposer = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// (error, unfiltered frames) -> stacktrace text
pub type StacktraceBuilder =
    Arc<dyn Fn(&(dyn Error + 'static), &[FrameDescriptor]) -> String + Send + Sync>;

/// Standard tag: short markers for VERBOSE/DEBUG, elapsed time for the rest,
/// severity stars for WARN/ERROR and wall-clock time for ERROR.
///
/// ```text
///   [V]: ...
///   [D]: ...
/// [I:250ms]: ...
/// *[W:03.010s]: ...
/// ***[ERROR:03.011s@14:02:59]: ...
/// ```
pub fn formatted_tag(stopwatch: Arc<dyn Stopwatch>) -> TagBuilder {
    Arc::new(move |level| {
        let elapsed = || format_elapsed(stopwatch.elapsed());
        match level {
            LogLevel::Verbose | LogLevel::Debug => {
                format!("{}[{}]", SPACE_BEFORE_TAG, level.initial())
            }
            LogLevel::Info => format!("[I:{}]", elapsed()),
            LogLevel::Warn => format!("*[W:{}]", elapsed()),
            LogLevel::Error => format!(
                "***[ERROR:{}@{}]",
                elapsed(),
                chrono::Local::now().format("%H:%M:%S")
            ),
        }
    })
}

/// `[V]`, `[D]`, ...
pub fn short_tag(level: LogLevel) -> String {
    format!("[{}]", level.initial())
}

/// `[VERBOSE]`, `[DEBUG]`, ...
pub fn full_tag(level: LogLevel) -> String {
    format!("[{}]", level.name())
}

/// Hides the level entirely
pub fn no_tag(_level: LogLevel) -> String {
    String::new()
}

/// `tag + ": " + details`
pub fn compose_message(tag: &str, details: &str) -> String {
    format!("{}{}{}", tag, TAG_MESSAGE_CONNECTOR, details)
}

/// Standard stacktrace: one line per caller frame that has a source line,
/// skipping the facade itself, indented two more spaces per frame.
///
/// ```text
///   my_app::load: ./src/load.rs, line 12
///     my_app::main: ./src/main.rs, line 4
/// ```
pub fn debuggable_stacktrace(_error: &(dyn Error + 'static), frames: &[FrameDescriptor]) -> String {
    let mut out = String::new();
    let mut depth = 0;
    for frame in frames {
        if is_facade_frame(frame) || !frame.has_source_line() {
            continue;
        }
        if let (Some(file), Some(line)) = (&frame.file, frame.line) {
            depth += 1;
            let _ = writeln!(
                out,
                "{}{}: {}, line {}",
                " ".repeat(depth * 2),
                frame.symbol,
                file,
                line
            );
        }
    }
    out
}

/// Every frame's description, unfiltered
pub fn raw_stacktrace(_error: &(dyn Error + 'static), frames: &[FrameDescriptor]) -> String {
    let mut out = String::new();
    for frame in frames {
        let _ = writeln!(out, "{}", frame.description());
    }
    out
}

/// Tag builder selection for configuration files
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    #[default]
    Formatted,
    Short,
    Full,
    None,
}

impl TagStyle {
    pub fn builder(self, stopwatch: Arc<dyn Stopwatch>) -> TagBuilder {
        match self {
            TagStyle::Formatted => formatted_tag(stopwatch),
            TagStyle::Short => Arc::new(short_tag),
            TagStyle::Full => Arc::new(full_tag),
            TagStyle::None => Arc::new(no_tag),
        }
    }
}

/// Stacktrace builder selection for configuration files
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StacktraceStyle {
    #[default]
    Debuggable,
    Raw,
    None,
}

impl StacktraceStyle {
    pub fn builder(self) -> Option<StacktraceBuilder> {
        match self {
            StacktraceStyle::Debuggable => Some(Arc::new(debuggable_stacktrace)),
            StacktraceStyle::Raw => Some(Arc::new(raw_stacktrace)),
            StacktraceStyle::None => None,
        }
    }
}
