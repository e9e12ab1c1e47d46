//! # Echoguard
//!
//! Near-duplicate suppression for streams of generated text responses.
//!
//! Echoguard keeps a bounded window of recently emitted responses and rejects
//! a new candidate when it is lexically too similar to any of them. Rejected
//! candidates are routed through an ordered list of fallback strategies that
//! rephrase the response, with an unconditional emergency rephrasing as the
//! last resort.
//!
//! ## Features
//!
//! - Jaro-Winkler similarity (pluggable through [`SimilarityScorer`])
//! - FIFO repetition window with inclusive similarity threshold
//! - First-fit fallback pipeline with seedable emergency fallback
//! - Running metrics over every processed response
//!
//! ## Example
//!
//! ```rust
//! use echoguard::{GuardConfig, ResponseProcessor};
//!
//! let config = GuardConfig::new(3, 0.8)?;
//! let mut processor = ResponseProcessor::with_seed(config, 7);
//!
//! let first = processor.process("Hello there!", None)?;
//! assert_eq!(first, "Hello there!");
//!
//! let second = processor.process("Hello there", None)?;
//! assert_ne!(second, "Hello there");
//!
//! let metrics = processor.metrics();
//! assert_eq!(metrics.total_responses, 2);
//! assert_eq!(metrics.duplicates_detected, 1);
//! # Ok::<(), echoguard::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod models;
pub mod observability;
pub mod services;

pub use config::{EchoguardConfig, GuardConfig};
pub use models::{ConversationContext, Response};
pub use services::{
    DuplicateCheckResult, DuplicateGuard, FallbackPipeline, FallbackStrategy, JaroWinklerScorer,
    LevenshteinScorer, MetricsAccumulator, MetricsSnapshot, PrefixStrategy, ResponseHistory,
    ResponseProcessor, SimilarityScorer,
};

/// Error type for echoguard operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidConfig` | Zero repetition window, threshold outside `[0, 1]` or NaN |
/// | `StrategyFailed` | A fallback strategy returned an error instead of an alternative |
/// | `OperationFailed` | Config file I/O or parsing fails, logging init fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The configuration is invalid.
    ///
    /// Raised once at construction time so that a bad window or threshold
    /// never reaches the duplicate check.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fallback strategy failed to produce an alternative.
    ///
    /// The pipeline stops at the failing strategy. History is left as it
    /// was before the failed attempt.
    #[error("fallback strategy '{strategy}' failed: {cause}")]
    StrategyFailed {
        /// Name of the strategy that failed.
        strategy: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for echoguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use echoguard::current_timestamp_ms;
///
/// assert!(current_timestamp_ms() > 0);
/// ```
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
