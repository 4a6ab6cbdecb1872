//! Configuration structures for EasyLogger.

use crate::core::builders::{StacktraceStyle, TagStyle};
use crate::core::level::LevelMask;
use crate::core::stack::{compile_patterns, DEFAULT_STACK_FILTERS};
use crate::error::{EasyLogError, Result};
use crate::facade::severity::Severity;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// --- default value helpers ---
fn default_level() -> String {
    "DEBUG_AND_ABOVE".to_string()
}
fn default_true() -> bool {
    true
}
fn default_stack_filters() -> Vec<String> {
    DEFAULT_STACK_FILTERS.iter().map(|p| p.to_string()).collect()
}
fn default_indent() -> char {
    ' '
}

/// Top-level configuration
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EasyLoggerConfig {
    /// Concerned-level mask of the primary logger, e.g. `"DEBUG_AND_ABOVE"` or
    /// `"VERBOSE | WARN_AND_ABOVE"`
    #[serde(default = "default_level")]
    pub default_level: String,
    #[serde(default)]
    pub tag_style: TagStyle,
    #[serde(default)]
    pub stacktrace_style: StacktraceStyle,
    #[serde(default)]
    pub console: ConsoleConfig,
    pub file: Option<FileSinkConfig>,
    #[serde(default)]
    pub stack: StackConfig,
}

impl Default for EasyLoggerConfig {
    fn default() -> Self {
        Self {
            default_level: default_level(),
            tag_style: TagStyle::default(),
            stacktrace_style: StacktraceStyle::default(),
            console: ConsoleConfig::default(),
            file: None,
            stack: StackConfig::default(),
        }
    }
}

impl EasyLoggerConfig {
    /// Parsed [`default_level`](Self::default_level)
    pub fn level_mask(&self) -> Result<LevelMask> {
        self.default_level.parse()
    }
}

/// Console sink settings
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub colored: bool,
    /// Route WARN and ERROR to stderr
    #[serde(default = "default_true")]
    pub stderr_for_warnings: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
            stderr_for_warnings: default_true(),
        }
    }
}

/// File sink settings
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    /// Concerned-level mask of the file logger; the top-level level when unset
    pub level: Option<String>,
    /// Append to an existing file instead of truncating it
    #[serde(default = "default_true")]
    pub append: bool,
}

impl FileSinkConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            level: None,
            append: default_true(),
        }
    }

    pub fn level_mask(&self, fallback: LevelMask) -> Result<LevelMask> {
        match &self.level {
            Some(level) => level.parse(),
            None => Ok(fallback),
        }
    }
}

/// Stack-frame filtering used by the extension facade
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Exclusion patterns matched against frame symbols
    #[serde(default = "default_stack_filters")]
    pub filters: Vec<String>,
    #[serde(default = "default_indent")]
    pub indent: char,
    /// Per-severity frame budgets, e.g. `{ WARN = 8 }`
    #[serde(default)]
    pub frames_per_level: HashMap<String, usize>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            filters: default_stack_filters(),
            indent: default_indent(),
            frames_per_level: HashMap::new(),
        }
    }
}

impl StackConfig {
    /// Budgets keyed by parsed severity
    pub fn budgets(&self) -> Result<Vec<(Severity, usize)>> {
        self.frames_per_level
            .iter()
            .map(|(name, count)| Ok((name.parse::<Severity>()?, *count)))
            .collect()
    }
}

/// Load `EasyLoggerConfig` from a TOML file.
pub fn load_config_from_file(path: &Path) -> Result<EasyLoggerConfig> {
    if !path.exists() {
        return Err(EasyLogError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = std::fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// Load `EasyLoggerConfig` from a TOML string.
pub fn load_config_from_str(config_str: &str) -> Result<EasyLoggerConfig> {
    let config: EasyLoggerConfig = toml::from_str(config_str)?;
    Ok(config)
}

/// Check the configuration for values that only fail at runtime.
pub fn validate_config(config: &EasyLoggerConfig) -> Result<()> {
    let level = config.level_mask()?;

    if let Some(ref file_config) = config.file {
        if file_config.path.as_os_str().is_empty() {
            return Err(EasyLogError::config("file sink path cannot be empty"));
        }
        file_config.level_mask(level)?;
    }

    compile_patterns(&config.stack.filters)?;
    config.stack.budgets()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = EasyLoggerConfig::default();
        assert_eq!(config.default_level, "DEBUG_AND_ABOVE");
        assert_eq!(config.level_mask().unwrap(), LevelMask::DEBUG_AND_ABOVE);
        assert_eq!(config.tag_style, TagStyle::Formatted);
        assert_eq!(config.stacktrace_style, StacktraceStyle::Debuggable);
        assert!(config.console.enabled);
        assert!(config.file.is_none());
        assert_eq!(config.stack.filters.len(), DEFAULT_STACK_FILTERS.len());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_config_from_str_empty() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, EasyLoggerConfig::default());
    }

    #[test]
    fn test_load_config_from_str_full() {
        let toml_str = r#"
            default_level = "VERBOSE | WARN_AND_ABOVE"
            tag_style = "full"
            stacktrace_style = "raw"

            [console]
            colored = false

            [file]
            path = "logs/app.log"
            level = "ERROR"
            append = false

            [stack]
            filters = ["^std::", "^my_app::generated"]
            indent = "-"
            frames_per_level = { WARN = 8, ERROR = 1 }
        "#;
        let config = load_config_from_str(toml_str).unwrap();
        assert_eq!(
            config.level_mask().unwrap(),
            LevelMask::VERBOSE | LevelMask::WARN_AND_ABOVE
        );
        assert_eq!(config.tag_style, TagStyle::Full);
        assert_eq!(config.stacktrace_style, StacktraceStyle::Raw);
        assert!(!config.console.colored);
        assert!(config.console.stderr_for_warnings);

        let file = config.file.as_ref().unwrap();
        assert_eq!(file.path, PathBuf::from("logs/app.log"));
        assert_eq!(
            file.level_mask(LevelMask::ALL).unwrap(),
            LevelMask::ERROR
        );
        assert!(!file.append);

        assert_eq!(config.stack.indent, '-');
        let mut budgets = config.stack.budgets().unwrap();
        budgets.sort();
        assert_eq!(budgets, vec![(Severity::Warn, 8), (Severity::Error, 1)]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            load_config_from_str("global_level = \"INFO\""),
            Err(EasyLogError::TomlError { .. })
        ));
    }

    #[test]
    fn test_validate_config_invalid_level() {
        let config = EasyLoggerConfig {
            default_level: "LOUD".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(EasyLogError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validate_config_invalid_file_path() {
        let config = EasyLoggerConfig {
            file: Some(FileSinkConfig::new("")),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(EasyLogError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_config_invalid_pattern() {
        let mut config = EasyLoggerConfig::default();
        config.stack.filters.push("(unclosed".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(EasyLogError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_validate_config_invalid_budget_level() {
        let mut config = EasyLoggerConfig::default();
        config.stack.frames_per_level.insert("LOUD".to_string(), 3);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_level = \"INFO_AND_ABOVE\"").unwrap();
        let config = load_config_from_file(file.path()).unwrap();
        assert_eq!(config.level_mask().unwrap(), LevelMask::INFO_AND_ABOVE);
    }

    #[test]
    fn test_load_config_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            load_config_from_file(&missing),
            Err(EasyLogError::ConfigFileMissing(_))
        ));
    }
}
