//! Response processor.
//!
//! Entry point for callers: scores each candidate, consults the guard,
//! drives the fallback pipeline on rejection and keeps running metrics.
//!
//! # Processing flow
//!
//! ```text
//! candidate ──► metrics (total, similarity to last)
//!                  │
//!                  ▼
//!            guard.is_allowed? ──yes──► commit ──► candidate
//!                  │ no
//!                  ▼
//!            duplicates += 1 ──► fallback.resolve ──► alternative
//! ```
//!
//! The processor is single-threaded. Wrap it in a `Mutex` to share it.

use crate::Result;
use crate::config::GuardConfig;
use crate::models::{ConversationContext, Response};
use tracing::instrument;

use super::fallback::{FallbackOutcome, FallbackPipeline, FallbackSource, FallbackStrategy};
use super::guard::DuplicateGuard;
use super::metrics::{MetricsAccumulator, MetricsSnapshot};
use super::similarity::{JaroWinklerScorer, SimilarityScorer};

/// Processes candidate responses through the duplicate guard.
///
/// # Example
///
/// ```rust
/// use echoguard::{GuardConfig, ResponseProcessor};
///
/// let mut processor = ResponseProcessor::with_seed(GuardConfig::new(3, 0.8)?, 1);
///
/// assert_eq!(processor.process("One", None)?, "One");
/// assert_eq!(processor.process("Two", None)?, "Two");
/// assert_ne!(processor.process("One", None)?, "One");
///
/// assert_eq!(processor.metrics().duplicates_detected, 1);
/// # Ok::<(), echoguard::Error>(())
/// ```
pub struct ResponseProcessor<S: SimilarityScorer = JaroWinklerScorer> {
    guard: DuplicateGuard<S>,
    fallback: FallbackPipeline,
    metrics: MetricsAccumulator,
}

impl ResponseProcessor<JaroWinklerScorer> {
    /// Creates a processor with the default fallback strategies.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self::from_parts(DuplicateGuard::new(config), FallbackPipeline::new())
    }

    /// Creates a processor whose emergency fallback is deterministic.
    #[must_use]
    pub fn with_seed(config: GuardConfig, seed: u64) -> Self {
        Self::from_parts(DuplicateGuard::new(config), FallbackPipeline::with_seed(seed))
    }

    /// Validates raw settings and creates a processor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if `repetition_window` is zero
    /// or `similarity_threshold` is outside `[0, 1]`.
    pub fn try_new(repetition_window: usize, similarity_threshold: f64) -> Result<Self> {
        GuardConfig::new(repetition_window, similarity_threshold).map(Self::new)
    }
}

impl<S: SimilarityScorer> ResponseProcessor<S> {
    /// Assembles a processor from an existing guard and pipeline.
    #[must_use]
    pub fn from_parts(guard: DuplicateGuard<S>, fallback: FallbackPipeline) -> Self {
        Self {
            guard,
            fallback,
            metrics: MetricsAccumulator::new(),
        }
    }

    /// Processes a candidate and returns the response to emit.
    ///
    /// Allowed candidates are committed and returned unchanged. Rejected
    /// candidates are counted as duplicates and resolved through the
    /// fallback pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StrategyFailed`] if a fallback strategy fails.
    /// Metrics for the call are still recorded.
    pub fn process(
        &mut self,
        candidate: &str,
        context: Option<&ConversationContext>,
    ) -> Result<String> {
        self.process_outcome(candidate, context)
            .map(ProcessOutcome::into_response)
    }

    /// Processes a candidate, reporting how the response was produced.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StrategyFailed`] if a fallback strategy fails.
    #[instrument(
        skip(self, candidate, context),
        fields(operation = "process_response", candidate_length = candidate.len())
    )]
    pub fn process_outcome(
        &mut self,
        candidate: &str,
        context: Option<&ConversationContext>,
    ) -> Result<ProcessOutcome> {
        let similarity = self.guard.similarity_to_last(candidate);
        self.metrics.record_response(candidate, similarity);
        metrics::counter!("echoguard_responses_total").increment(1);
        metrics::histogram!("echoguard_similarity_to_last").record(similarity);

        if self.guard.is_allowed(candidate) {
            self.guard.commit(candidate);
            tracing::debug!(similarity = similarity, "Candidate accepted");
            return Ok(ProcessOutcome::Accepted(candidate.to_string()));
        }

        self.metrics.record_duplicate();
        tracing::info!(
            similarity = similarity,
            duplicates = self.metrics.duplicates_detected(),
            "Duplicate candidate, resolving fallback"
        );

        let outcome = self
            .fallback
            .resolve_outcome(&mut self.guard, candidate, context)
            .inspect_err(|_| {
                metrics::counter!("echoguard_duplicates_total", "resolution" => "error")
                    .increment(1);
            })?;

        let resolution = match outcome.source {
            FallbackSource::Strategy(_) => "strategy",
            FallbackSource::Emergency => "emergency",
        };
        metrics::counter!("echoguard_duplicates_total", "resolution" => resolution).increment(1);

        Ok(ProcessOutcome::Fallback(outcome))
    }

    /// Current metrics.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Appends a fallback strategy after the existing ones.
    pub fn add_fallback_strategy(&mut self, strategy: impl FallbackStrategy + 'static) {
        self.fallback.add_strategy(strategy);
    }

    /// Removes every fallback strategy. Idempotent.
    pub fn clear_fallback_strategies(&mut self) {
        self.fallback.clear_strategies();
    }

    /// Whether `text` would pass the guard right now.
    pub fn is_response_allowed(&mut self, text: &str) -> bool {
        self.guard.is_allowed(text)
    }

    /// Commits `text` to history without checking or counting it.
    pub fn add_response(&mut self, text: &str) {
        self.guard.commit(text);
    }

    /// Clears the response history. Metrics are kept.
    pub fn clear_history(&mut self) {
        self.guard.clear_history();
    }

    /// The guard configuration.
    #[must_use]
    pub const fn config(&self) -> GuardConfig {
        self.guard.config()
    }

    /// A copy of the response history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Response> {
        self.guard.history()
    }

    /// The fallback pipeline.
    #[must_use]
    pub const fn fallback(&self) -> &FallbackPipeline {
        &self.fallback
    }
}

impl<S: SimilarityScorer> std::fmt::Debug for ResponseProcessor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseProcessor")
            .field("guard", &self.guard)
            .field("fallback", &self.fallback)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// How a processed response was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The candidate passed the guard and was committed.
    Accepted(String),
    /// The candidate was a duplicate and the fallback pipeline answered.
    Fallback(FallbackOutcome),
}

impl ProcessOutcome {
    /// The response to emit.
    #[must_use]
    pub fn response(&self) -> &str {
        match self {
            Self::Accepted(response) => response,
            Self::Fallback(outcome) => &outcome.response,
        }
    }

    /// Consumes the outcome, returning the response to emit.
    #[must_use]
    pub fn into_response(self) -> String {
        match self {
            Self::Accepted(response) => response,
            Self::Fallback(outcome) => outcome.response,
        }
    }

    /// Whether the candidate was rejected as a duplicate.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}
