//! Duplicate suppression services.
//!
//! Components, leaf first:
//!
//! ```text
//! ResponseProcessor
//! ├── DuplicateGuard
//! │   ├── ResponseHistory     FIFO window of accepted responses
//! │   └── SimilarityScorer    Jaro-Winkler by default
//! ├── FallbackPipeline        ordered strategies + emergency prefix
//! └── MetricsAccumulator      running counters
//! ```

mod fallback;
mod guard;
mod history;
mod metrics;
mod processor;
mod similarity;

pub use fallback::{
    DEFAULT_STRATEGY_PREFIXES, EMERGENCY_PREFIXES, FallbackOutcome, FallbackPipeline,
    FallbackSource, FallbackStrategy, FnStrategy, PrefixStrategy,
};
pub use guard::{DuplicateCheckResult, DuplicateGuard};
pub use history::ResponseHistory;
pub use metrics::{MetricsAccumulator, MetricsSnapshot};
pub use processor::{ProcessOutcome, ResponseProcessor};
pub use similarity::{JaroWinklerScorer, LevenshteinScorer, SimilarityScorer, jaro_winkler};
