//! Error types for EasyLogger
//!
//! This module defines the error types used throughout the crate. Logging
//! calls themselves never surface these to the caller; they appear on the
//! query side (moment lookups, configuration loading) and inside the pipeline
//! where they are caught and routed to the fallback logger.

use thiserror::Error;

/// Main error type for EasyLogger operations
#[derive(Error, Debug)]
pub enum EasyLogError {
    /// A required argument was missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Template and arguments do not fit together
    #[error("Malformed format: format='{format}', args=[{args}]")]
    MalformedFormat { format: String, args: String },

    /// A sink refused or failed to persist a message
    #[error("Sink failure: {0}")]
    SinkFailure(String),

    /// A tag, message or stacktrace builder panicked
    #[error("Builder failure: {0}")]
    BuilderFailure(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid log level or level mask name
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Stack filter pattern failed to compile
    #[error("Invalid stack filter pattern: {source}")]
    InvalidPattern {
        #[from]
        source: regex::Error,
    },

    /// I/O errors (file sinks, configuration files)
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },
}

/// Result type alias for EasyLogger operations
pub type Result<T> = std::result::Result<T, EasyLogError>;

impl EasyLogError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new malformed format error; `args` is the positional list,
    /// e.g. `[0]a,[1]b`
    pub fn malformed_format<F: Into<String>, A: Into<String>>(format: F, args: A) -> Self {
        Self::MalformedFormat {
            format: format.into(),
            args: args.into(),
        }
    }

    /// Create a new sink failure
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::SinkFailure(msg.into())
    }

    /// Create a new builder failure
    pub fn builder<S: Into<String>>(msg: S) -> Self {
        Self::BuilderFailure(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the failure happened while a message was being delivered
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(self, Self::SinkFailure(_) | Self::BuilderFailure(_))
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "argument",
            Self::MalformedFormat { .. } => "format",
            Self::SinkFailure(_) => "sink",
            Self::BuilderFailure(_) => "builder",
            Self::ConfigError(_)
            | Self::ConfigFileMissing(_)
            | Self::InvalidLogLevel(_)
            | Self::InvalidPattern { .. } => "config",
            Self::IoError { .. } => "io",
            Self::TomlError { .. } => "toml",
        }
    }
}
