//! Ordinal severities of the extension facade

use crate::core::level::LogLevel;
use crate::error::EasyLogError;
use std::fmt;
use std::str::FromStr;

/// Severity of a message, ordered from least to most severe. `None` sits
/// above every real severity and is never logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::None,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::None => "NONE",
        }
    }

    /// The matching atomic level, if any
    pub const fn log_level(self) -> Option<LogLevel> {
        match self {
            Severity::Verbose => Some(LogLevel::Verbose),
            Severity::Debug => Some(LogLevel::Debug),
            Severity::Info => Some(LogLevel::Info),
            Severity::Warn => Some(LogLevel::Warn),
            Severity::Error => Some(LogLevel::Error),
            Severity::None => None,
        }
    }
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Verbose => Severity::Verbose,
            LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = EasyLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        Severity::ALL
            .into_iter()
            .find(|severity| severity.name() == name)
            .ok_or_else(|| EasyLogError::InvalidLogLevel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Severity::Verbose < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!(" NONE ".parse::<Severity>().unwrap(), Severity::None);
        assert!("TRACE".parse::<Severity>().is_err());
        assert_eq!(Severity::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_level_conversion() {
        for level in LogLevel::ALL {
            assert_eq!(Severity::from(level).log_level(), Some(level));
        }
        assert_eq!(Severity::None.log_level(), None);
    }
}
