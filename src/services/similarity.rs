//! Lexical similarity scoring.
//!
//! Scores are normalized to `[0, 1]`: `1.0` for identical strings, `0.0` for
//! strings with nothing in common. Two empty strings score `1.0`; an empty
//! string against a non-empty one scores `0.0`.
//!
//! Comparison is on raw characters. No case folding or whitespace
//! normalization is applied, so `"Hello"` and `"hello"` are not identical.

/// A normalized string similarity metric.
///
/// Implementations must be pure and deterministic, and return values in
/// `[0, 1]`.
pub trait SimilarityScorer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Scores the similarity of `a` and `b`.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaro-Winkler similarity.
///
/// Character matches are counted inside an alignment window of half the
/// longer string's length, and a shared prefix of up to four characters
/// boosts the score. This is the default metric.
///
/// # Example
///
/// ```rust
/// use echoguard::{JaroWinklerScorer, SimilarityScorer};
///
/// let scorer = JaroWinklerScorer;
/// assert!((scorer.score("hello", "hello") - 1.0).abs() < f64::EPSILON);
/// assert!(scorer.score("Hello there!", "Hello there") > 0.8);
/// assert!(scorer.score("abc", "xyz").abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JaroWinklerScorer;

impl SimilarityScorer for JaroWinklerScorer {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(a, b)
    }
}

/// Normalized Levenshtein similarity.
///
/// `1 - distance / max_len`. Has no prefix weighting, so it is stricter than
/// Jaro-Winkler on short strings that differ in their first characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevenshteinScorer;

impl SimilarityScorer for LevenshteinScorer {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        clamp_unit(strsim::normalized_levenshtein(a, b))
    }
}

/// Jaro-Winkler similarity of two strings.
///
/// # Example
///
/// ```rust
/// use echoguard::services::jaro_winkler;
///
/// assert!((jaro_winkler("", "") - 1.0).abs() < f64::EPSILON);
/// assert!(jaro_winkler("", "a").abs() < f64::EPSILON);
/// ```
#[must_use]
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => clamp_unit(strsim::jaro_winkler(a, b)),
    }
}

/// Guards against floating point drift past the unit interval.
fn clamp_unit(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}
