//! Duplicate guard.
//!
//! Combines a [`ResponseHistory`] with a [`SimilarityScorer`] to decide
//! whether a candidate may be emitted.
//!
//! Checking and committing are separate steps. Callers that want the check
//! enforced must call [`DuplicateGuard::is_allowed`] before
//! [`DuplicateGuard::commit`]; the pair is not atomic.

use crate::config::GuardConfig;
use crate::models::Response;
use serde::Serialize;
use tracing::instrument;

use super::history::ResponseHistory;
use super::similarity::{JaroWinklerScorer, SimilarityScorer};

/// Result of checking a candidate against the history window.
///
/// # Example
///
/// ```rust
/// use echoguard::{DuplicateGuard, GuardConfig};
///
/// let mut guard = DuplicateGuard::new(GuardConfig::new(3, 0.8)?);
/// guard.commit("Hello there!");
///
/// let result = guard.check("Hello there");
/// assert!(result.is_duplicate);
/// assert_eq!(result.matched_content.as_deref(), Some("Hello there!"));
/// # Ok::<(), echoguard::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCheckResult {
    /// Whether any entry met or exceeded the threshold.
    pub is_duplicate: bool,

    /// Highest similarity seen across the window (0.0 when empty).
    pub max_similarity: f64,

    /// Content of the entry that produced `max_similarity`, when it triggered
    /// a duplicate.
    pub matched_content: Option<String>,

    /// Number of history entries compared.
    pub compared: usize,
}

impl DuplicateCheckResult {
    /// Creates a result for a candidate that passed the check.
    #[must_use]
    pub const fn allowed(max_similarity: f64, compared: usize) -> Self {
        Self {
            is_duplicate: false,
            max_similarity,
            matched_content: None,
            compared,
        }
    }

    /// Creates a result for a candidate that collided with `matched_content`.
    #[must_use]
    pub const fn duplicate(max_similarity: f64, matched_content: String, compared: usize) -> Self {
        Self {
            is_duplicate: true,
            max_similarity,
            matched_content: Some(matched_content),
            compared,
        }
    }
}

/// Guard that rejects candidates too similar to recent responses.
///
/// The guard exclusively owns its history. Its configuration is fixed for
/// its lifetime.
pub struct DuplicateGuard<S: SimilarityScorer = JaroWinklerScorer> {
    config: GuardConfig,
    history: ResponseHistory,
    scorer: S,
}

impl DuplicateGuard<JaroWinklerScorer> {
    /// Creates a guard using Jaro-Winkler similarity.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self::with_scorer(config, JaroWinklerScorer)
    }
}

impl<S: SimilarityScorer> DuplicateGuard<S> {
    /// Creates a guard with a custom similarity metric.
    #[must_use]
    pub fn with_scorer(config: GuardConfig, scorer: S) -> Self {
        Self {
            config,
            history: ResponseHistory::new(config.window()),
            scorer,
        }
    }

    /// Checks a candidate against every entry in the window.
    ///
    /// The history is truncated to the window first. The threshold is
    /// inclusive: a score equal to it counts as a duplicate.
    #[instrument(
        skip(self, candidate),
        fields(
            operation = "duplicate_check",
            scorer = self.scorer.name(),
            candidate_length = candidate.len()
        )
    )]
    pub fn check(&mut self, candidate: &str) -> DuplicateCheckResult {
        self.history.truncate_to_window();

        let threshold = self.config.similarity_threshold();
        let mut best: Option<(f64, &Response)> = None;
        for entry in self.history.iter() {
            let score = self.scorer.score(&entry.content, candidate);
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, entry));
            }
        }

        let compared = self.history.len();
        match best {
            Some((score, entry)) if score >= threshold => {
                tracing::debug!(
                    similarity = score,
                    threshold = threshold,
                    compared = compared,
                    "Candidate rejected as duplicate"
                );
                DuplicateCheckResult::duplicate(score, entry.content.clone(), compared)
            },
            Some((score, _)) => DuplicateCheckResult::allowed(score, compared),
            None => DuplicateCheckResult::allowed(0.0, 0),
        }
    }

    /// Returns `true` if no entry in the window is at or above the threshold.
    pub fn is_allowed(&mut self, candidate: &str) -> bool {
        !self.check(candidate).is_duplicate
    }

    /// Appends a candidate to the history without checking it.
    pub fn commit(&mut self, candidate: impl Into<String>) {
        self.history.append(candidate);
        metrics::gauge!("echoguard_history_size").set(self.history.len() as f64);
    }

    /// Similarity of `candidate` to the most recent entry only.
    ///
    /// Returns `0.0` when the history is empty.
    #[must_use]
    pub fn similarity_to_last(&self, candidate: &str) -> f64 {
        self.history
            .last()
            .map_or(0.0, |last| self.scorer.score(&last.content, candidate))
    }

    /// Removes every entry from the history. Idempotent.
    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::debug!("Cleared response history");
    }

    /// A copy of the current history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Response> {
        self.history.snapshot()
    }

    /// The guard's configuration.
    #[must_use]
    pub const fn config(&self) -> GuardConfig {
        self.config
    }

    /// The similarity metric in use.
    #[must_use]
    pub const fn scorer(&self) -> &S {
        &self.scorer
    }
}

impl Default for DuplicateGuard<JaroWinklerScorer> {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl<S: SimilarityScorer> std::fmt::Debug for DuplicateGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateGuard")
            .field("config", &self.config)
            .field("history_len", &self.history.len())
            .field("scorer", &self.scorer.name())
            .finish()
    }
}
