//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `ECHOGUARD_*` environment variables. Command-line flags are applied
//! on top by the binary.

mod guard;

pub use guard::{
    DEFAULT_REPETITION_WINDOW, DEFAULT_SIMILARITY_THRESHOLD, ENV_REPETITION_WINDOW,
    ENV_SIMILARITY_THRESHOLD, GuardConfig,
};

use crate::observability::{LogFormat, LoggingConfig};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration for the echoguard binary.
#[derive(Debug, Clone, Default)]
pub struct EchoguardConfig {
    /// Duplicate guard settings.
    pub guard: GuardConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings as read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive (e.g. `info`, `echoguard=debug`).
    pub level: Option<String>,
    /// Output format.
    pub format: Option<LogFormat>,
}

impl LoggingSettings {
    /// Resolves the settings into a logging configuration.
    #[must_use]
    pub fn to_logging_config(&self, verbose: bool) -> LoggingConfig {
        LoggingConfig::from_settings(self.level.as_deref(), self.format, verbose)
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Repetition window.
    pub repetition_window: Option<usize>,
    /// Similarity threshold.
    pub similarity_threshold: Option<f64>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
}

impl EchoguardConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// guard values it contains are invalid.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or the
    /// guard values are invalid.
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/echoguard/config.toml` on
    /// Linux). Returns the defaults if no file is found or it fails to load.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs
            .config_dir()
            .join("echoguard")
            .join("config.toml");
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Applies `ECHOGUARD_*` environment overrides to the guard settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if an override is out of range.
    pub fn with_env_overrides(self) -> crate::Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `ECHOGUARD_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if an override is out of range.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        self.guard = self.guard.with_overrides_from(lookup)?;
        Ok(self)
    }

    /// Converts a `ConfigFile` to `EchoguardConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let defaults = GuardConfig::default();
        let guard = GuardConfig::new(
            file.repetition_window
                .unwrap_or_else(|| defaults.repetition_window()),
            file.similarity_threshold
                .unwrap_or_else(|| defaults.similarity_threshold()),
        )?;

        let logging = match file.logging {
            Some(l) => LoggingSettings {
                level: l.level,
                format: l.format.as_deref().map(LogFormat::parse).transpose()?,
            },
            None => LoggingSettings::default(),
        };

        Ok(Self { guard, logging })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_file() {
        let config = EchoguardConfig::from_toml_str(
            r#"
            repetition_window = 10
            similarity_threshold = 0.9

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.guard.repetition_window(), 10);
        assert!((config.guard.similarity_threshold() - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format, Some(LogFormat::Json));
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = EchoguardConfig::from_toml_str("repetition_window = 4").unwrap();

        assert_eq!(config.guard.repetition_window(), 4);
        assert!(
            (config.guard.similarity_threshold() - DEFAULT_SIMILARITY_THRESHOLD).abs()
                < f64::EPSILON
        );
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = EchoguardConfig::from_toml_str("similarity_threshold = 1.5");
        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));

        let result = EchoguardConfig::from_toml_str("repetition_window = 0");
        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = EchoguardConfig::from_toml_str("repetition_window = [");
        assert!(matches!(
            result,
            Err(crate::Error::OperationFailed { ref operation, .. }) if operation == "parse_config_file"
        ));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result = EchoguardConfig::from_toml_str("[logging]\nformat = \"xml\"");
        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = EchoguardConfig::from_toml_str("repetition_windw = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "repetition_window = 7").unwrap();
        writeln!(file, "similarity_threshold = 0.75").unwrap();

        let config = EchoguardConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.guard.repetition_window(), 7);
        assert!((config.guard.similarity_threshold() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EchoguardConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(
            result,
            Err(crate::Error::OperationFailed { ref operation, .. }) if operation == "read_config_file"
        ));
    }

    #[test]
    fn test_env_layered_over_file() {
        let config = EchoguardConfig::from_toml_str(
            r"
            repetition_window = 10
            similarity_threshold = 0.9
            ",
        )
        .unwrap()
        .with_overrides_from(|key| (key == ENV_SIMILARITY_THRESHOLD).then(|| "0.7".to_string()))
        .unwrap();

        // File value survives where no override is set.
        assert_eq!(config.guard.repetition_window(), 10);
        assert!((config.guard.similarity_threshold() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_out_of_range_over_file() {
        let result = EchoguardConfig::from_toml_str("repetition_window = 10")
            .unwrap()
            .with_overrides_from(|key| (key == ENV_REPETITION_WINDOW).then(|| "0".to_string()));

        assert!(matches!(result, Err(crate::Error::InvalidConfig(_))));
    }
}
