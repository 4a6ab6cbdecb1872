//! Console sink
//!
//! Writes messages to standard output, with WARN and ERROR going to standard
//! error, optionally coloured per level.

use crate::config::ConsoleConfig;
use crate::core::level::LogLevel;
use crate::sinks::traits::{Sink, SinkResult};
use colored::{ColoredString, Colorize};
use std::io::{self, Write};

/// Console output sink
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    config: ConsoleConfig,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl ConsoleSink {
    pub fn new(config: ConsoleConfig) -> Self {
        Self { config }
    }

    /// Plain output, everything on stdout
    pub fn plain() -> Self {
        Self::new(ConsoleConfig {
            enabled: true,
            colored: false,
            stderr_for_warnings: false,
        })
    }

    pub fn with_colors(mut self, colored: bool) -> Self {
        self.config.colored = colored;
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    fn should_use_stderr(&self, level: LogLevel) -> bool {
        self.config.stderr_for_warnings && matches!(level, LogLevel::Warn | LogLevel::Error)
    }

    fn format_message(&self, level: LogLevel, message: &str) -> String {
        if self.config.colored {
            colorize(level, message).to_string()
        } else {
            message.to_string()
        }
    }
}

fn colorize(level: LogLevel, message: &str) -> ColoredString {
    match level {
        LogLevel::Error => message.red().bold(),
        LogLevel::Warn => message.yellow(),
        LogLevel::Info => message.green(),
        LogLevel::Debug => message.cyan(),
        LogLevel::Verbose => message.dimmed(),
    }
}

impl Sink for ConsoleSink {
    fn write(&self, level: LogLevel, message: &str) -> SinkResult<()> {
        let formatted = self.format_message(level, message);
        if self.should_use_stderr(level) {
            let mut stderr = io::stderr().lock();
            writeln!(stderr, "{}", formatted)?;
            stderr.flush()?;
        } else {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", formatted)?;
            stdout.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        io::stdout().flush()?;
        io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }

    fn stats(&self) -> String {
        format!(
            "ConsoleSink: colored={}, stderr_for_warnings={}",
            self.config.colored, self.config.stderr_for_warnings
        )
    }
}
