//! Running metrics over processed responses.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;

/// Point-in-time view of processor metrics.
///
/// `average_similarity` is rounded to two decimals for display;
/// `total_similarity_score` keeps full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Candidates passed to the processor.
    pub total_responses: u64,
    /// Candidates rejected by the guard.
    pub duplicates_detected: u64,
    /// Mean similarity to the previous response, rounded to 2 decimals.
    pub average_similarity: f64,
    /// Distinct candidate strings seen.
    pub unique_responses: u64,
    /// Sum of similarity-to-previous scores.
    pub total_similarity_score: f64,
    /// Milliseconds since collection started.
    pub collection_time_ms: u64,
}

/// Accumulates processor metrics.
///
/// Distinct candidates are tracked by 64-bit content hash rather than by
/// storing the strings.
///
/// The hash set is not bounded by the repetition window: it grows by one
/// `u64` per distinct candidate for the lifetime of the accumulator. Replace
/// the processor to reset it in long-running services.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    total_responses: u64,
    duplicates_detected: u64,
    total_similarity: f64,
    unique_hashes: HashSet<u64>,
    started_at: Instant,
}

impl MetricsAccumulator {
    /// Creates an empty accumulator. Collection time starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_responses: 0,
            duplicates_detected: 0,
            total_similarity: 0.0,
            unique_hashes: HashSet::new(),
            started_at: Instant::now(),
        }
    }

    /// Records a processed candidate and its similarity to the previous
    /// response.
    pub fn record_response(&mut self, candidate: &str, similarity: f64) {
        self.total_responses += 1;
        self.total_similarity += similarity;
        self.unique_hashes.insert(content_hash(candidate));
    }

    /// Records that the last candidate was rejected as a duplicate.
    pub const fn record_duplicate(&mut self) {
        self.duplicates_detected += 1;
    }

    /// Full-precision running average; `0.0` before any response.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_similarity(&self) -> f64 {
        if self.total_responses == 0 {
            return 0.0;
        }
        self.total_similarity / self.total_responses as f64
    }

    /// Candidates recorded so far.
    #[must_use]
    pub const fn total_responses(&self) -> u64 {
        self.total_responses
    }

    /// Duplicates recorded so far.
    #[must_use]
    pub const fn duplicates_detected(&self) -> u64 {
        self.duplicates_detected
    }

    /// Takes a snapshot of the current counters.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_responses: self.total_responses,
            duplicates_detected: self.duplicates_detected,
            average_similarity: round2(self.average_similarity()),
            unique_responses: self.unique_hashes.len() as u64,
            total_similarity_score: self.total_similarity,
            collection_time_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
