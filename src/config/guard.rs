//! Duplicate guard configuration.

use crate::{Error, Result};
use serde::Serialize;
use std::num::NonZeroUsize;

/// Default number of recent responses checked for repetition.
pub const DEFAULT_REPETITION_WINDOW: usize = 25;

/// Default similarity at or above which a candidate counts as a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.82;

/// Environment variable overriding the repetition window.
pub const ENV_REPETITION_WINDOW: &str = "ECHOGUARD_REPETITION_WINDOW";

/// Environment variable overriding the similarity threshold.
pub const ENV_SIMILARITY_THRESHOLD: &str = "ECHOGUARD_SIMILARITY_THRESHOLD";

/// Validated configuration for a duplicate guard.
///
/// Fields are private so an instance can only exist once validated. A guard
/// keeps its configuration for its whole lifetime; replace the guard to
/// change it.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `ECHOGUARD_REPETITION_WINDOW` | usize | `25` | Responses kept in the window |
/// | `ECHOGUARD_SIMILARITY_THRESHOLD` | f64 | `0.82` | Inclusive duplicate threshold |
///
/// # Example
///
/// ```rust
/// use echoguard::GuardConfig;
///
/// let config = GuardConfig::new(3, 0.8)?;
/// assert_eq!(config.repetition_window(), 3);
/// assert!((config.similarity_threshold() - 0.8).abs() < f64::EPSILON);
///
/// assert!(GuardConfig::new(0, 0.8).is_err());
/// assert!(GuardConfig::new(3, 1.5).is_err());
/// # Ok::<(), echoguard::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuardConfig {
    repetition_window: NonZeroUsize,
    similarity_threshold: f64,
}

impl GuardConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `repetition_window` is zero or
    /// `similarity_threshold` is NaN or outside `[0, 1]`.
    pub fn new(repetition_window: usize, similarity_threshold: f64) -> Result<Self> {
        let Some(repetition_window) = NonZeroUsize::new(repetition_window) else {
            return Err(Error::InvalidConfig(
                "repetition_window must be greater than 0".to_string(),
            ));
        };
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "similarity_threshold must be within [0, 1], got {similarity_threshold}"
            )));
        }

        Ok(Self {
            repetition_window,
            similarity_threshold,
        })
    }

    /// Creates a configuration from environment variables.
    ///
    /// Unset or unparseable variables fall back to the defaults; the merged
    /// values are then validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a parsed value is out of range.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a parsed value is out of range.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `ECHOGUARD_*` overrides read through `lookup`.
    ///
    /// Missing or unparseable values keep the current setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a parsed value is out of range.
    pub fn with_overrides_from(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let window = lookup(ENV_REPETITION_WINDOW)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_else(|| self.repetition_window());

        let threshold = lookup(ENV_SIMILARITY_THRESHOLD)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.similarity_threshold);

        Self::new(window, threshold)
    }

    /// Returns a copy with a different repetition window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `window` is zero.
    pub fn with_repetition_window(self, window: usize) -> Result<Self> {
        Self::new(window, self.similarity_threshold)
    }

    /// Returns a copy with a different similarity threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `threshold` is outside `[0, 1]`.
    pub fn with_similarity_threshold(self, threshold: f64) -> Result<Self> {
        Self::new(self.repetition_window(), threshold)
    }

    /// Maximum number of recent responses checked for repetition.
    #[must_use]
    pub const fn repetition_window(&self) -> usize {
        self.repetition_window.get()
    }

    /// Repetition window as a non-zero count.
    #[must_use]
    pub const fn window(&self) -> NonZeroUsize {
        self.repetition_window
    }

    /// Inclusive similarity threshold for duplicates.
    #[must_use]
    pub const fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            repetition_window: NonZeroUsize::new(DEFAULT_REPETITION_WINDOW)
                .unwrap_or(NonZeroUsize::MIN),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < f64::EPSILON
    }

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.repetition_window(), 25);
        assert!(approx_eq(config.similarity_threshold(), 0.82));
    }

    #[test_case(1, 0.0 ; "zero threshold")]
    #[test_case(1, 1.0 ; "unit threshold")]
    #[test_case(3, 0.8 ; "typical")]
    #[test_case(10_000, 0.5 ; "large window")]
    fn test_valid_config(window: usize, threshold: f64) {
        let config = GuardConfig::new(window, threshold).unwrap();
        assert_eq!(config.repetition_window(), window);
        assert!(approx_eq(config.similarity_threshold(), threshold));
    }

    #[test_case(0, 0.8 ; "zero window")]
    #[test_case(3, -0.01 ; "negative threshold")]
    #[test_case(3, 1.01 ; "threshold above one")]
    #[test_case(3, f64::NAN ; "nan threshold")]
    #[test_case(3, f64::INFINITY ; "infinite threshold")]
    fn test_invalid_config(window: usize, threshold: f64) {
        let result = GuardConfig::new(window, threshold);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_methods_revalidate() {
        let config = GuardConfig::default()
            .with_repetition_window(5)
            .and_then(|c| c.with_similarity_threshold(0.9))
            .unwrap();

        assert_eq!(config.repetition_window(), 5);
        assert!(approx_eq(config.similarity_threshold(), 0.9));

        assert!(config.with_repetition_window(0).is_err());
        assert!(config.with_similarity_threshold(2.0).is_err());
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_overrides_applied() {
        let vars = [
            (ENV_REPETITION_WINDOW, "2"),
            (ENV_SIMILARITY_THRESHOLD, " 0.95 "),
        ];
        let config = GuardConfig::default()
            .with_overrides_from(lookup(&vars))
            .unwrap();

        assert_eq!(config.repetition_window(), 2);
        assert!(approx_eq(config.similarity_threshold(), 0.95));
    }

    #[test]
    fn test_overrides_absent_keep_base() {
        let base = GuardConfig::new(7, 0.6).unwrap();
        let config = base.with_overrides_from(|_| None).unwrap();
        assert_eq!(config, base);
    }

    #[test_case(ENV_REPETITION_WINDOW, "many" ; "unparseable window")]
    #[test_case(ENV_REPETITION_WINDOW, "-3" ; "negative window")]
    #[test_case(ENV_SIMILARITY_THRESHOLD, "abc" ; "unparseable threshold")]
    fn test_unparseable_override_keeps_base(key: &str, value: &str) {
        let base = GuardConfig::new(7, 0.6).unwrap();
        let vars = [(key, value)];

        let config = base.with_overrides_from(lookup(&vars)).unwrap();

        assert_eq!(config, base);
    }

    #[test_case(ENV_REPETITION_WINDOW, "0" ; "zero window")]
    #[test_case(ENV_SIMILARITY_THRESHOLD, "1.5" ; "threshold above one")]
    #[test_case(ENV_SIMILARITY_THRESHOLD, "NaN" ; "nan threshold")]
    fn test_out_of_range_override_rejected(key: &str, value: &str) {
        let vars = [(key, value)];

        let result = GuardConfig::default().with_overrides_from(lookup(&vars));

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
