//! Structured logging configuration.

use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Default filter directive.
const DEFAULT_LEVEL: &str = "info";

/// Filter directive used when verbose output is requested.
const VERBOSE_LEVEL: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format string, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for anything other than `pretty` or
    /// `json`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidConfig(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{other}\""
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Builds logging configuration from optional file settings.
    ///
    /// `verbose` raises the default directive to `debug` but never overrides
    /// an explicitly configured level.
    #[must_use]
    pub fn from_settings(level: Option<&str>, format: Option<LogFormat>, verbose: bool) -> Self {
        let default_level = if verbose { VERBOSE_LEVEL } else { DEFAULT_LEVEL };
        Self {
            level: level.unwrap_or(default_level).to_string(),
            format: format.unwrap_or_default(),
        }
    }

    /// Builds the filter, preferring `RUST_LOG` when it is set and valid.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_settings(None, None, false)
    }
}
