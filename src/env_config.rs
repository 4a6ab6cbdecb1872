//! Environment overrides
//!
//! `EASY_LOGGER_CONFIG` names a TOML configuration file and
//! `EASY_LOGGER_LEVEL` overrides the primary logger's level mask.

use crate::config::{load_config_from_file, validate_config, EasyLoggerConfig};
use crate::core::level::LevelMask;
use crate::error::Result;
use std::env;
use std::path::{Path, PathBuf};

pub const LEVEL_VAR: &str = "EASY_LOGGER_LEVEL";
pub const CONFIG_VAR: &str = "EASY_LOGGER_CONFIG";

/// Environment variable reader
pub struct EnvConfig;

impl EnvConfig {
    /// Level mask from `EASY_LOGGER_LEVEL`, e.g. `INFO_AND_ABOVE`
    pub fn level() -> Result<Option<LevelMask>> {
        match Self::level_string() {
            Some(level) => Ok(Some(level.parse()?)),
            None => Ok(None),
        }
    }

    fn level_string() -> Option<String> {
        env::var(LEVEL_VAR).ok().filter(|s| !s.trim().is_empty())
    }

    /// Configuration file named by `EASY_LOGGER_CONFIG`
    pub fn config_path() -> Option<PathBuf> {
        env::var_os(CONFIG_VAR)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    /// Configuration from the environment: the named file (or defaults) with
    /// the level override applied, validated.
    pub fn load() -> Result<EasyLoggerConfig> {
        resolve_config(
            Self::config_path().as_deref(),
            Self::level_string().as_deref(),
        )
    }
}

/// Load `config_path` (defaults when `None`), override its level with `level`
/// and validate the result.
pub fn resolve_config(config_path: Option<&Path>, level: Option<&str>) -> Result<EasyLoggerConfig> {
    let mut config = match config_path {
        Some(path) => load_config_from_file(path)?,
        None => EasyLoggerConfig::default(),
    };
    if let Some(level) = level {
        config.default_level = level.trim().to_string();
    }
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EasyLogError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolve_defaults() {
        let config = resolve_config(None, None).unwrap();
        assert_eq!(config, EasyLoggerConfig::default());
    }

    #[test]
    fn test_resolve_level_override() {
        let config = resolve_config(None, Some(" warn_and_above ")).unwrap();
        assert_eq!(config.level_mask().unwrap(), LevelMask::WARN_AND_ABOVE);

        assert!(matches!(
            resolve_config(None, Some("LOUD")),
            Err(EasyLogError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_resolve_file_then_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_level = \"ERROR\"\ntag_style = \"short\"").unwrap();

        let config = resolve_config(Some(file.path()), None).unwrap();
        assert_eq!(config.level_mask().unwrap(), LevelMask::ERROR);

        let config = resolve_config(Some(file.path()), Some("ALL")).unwrap();
        assert_eq!(config.level_mask().unwrap(), LevelMask::ALL);
        assert_eq!(config.tag_style, crate::core::builders::TagStyle::Short);
    }

    #[test]
    fn test_resolve_missing_file() {
        assert!(matches!(
            resolve_config(Some(Path::new("/nonexistent/easy_logger.toml")), None),
            Err(EasyLogError::ConfigFileMissing(_))
        ));
    }

    #[test]
    fn test_env_level() {
        env::set_var(LEVEL_VAR, "INFO | ERROR");
        let level = EnvConfig::level().unwrap();
        env::remove_var(LEVEL_VAR);
        assert_eq!(level, Some(LevelMask::INFO | LevelMask::ERROR));
        assert_eq!(EnvConfig::level().unwrap(), None);
    }
}
