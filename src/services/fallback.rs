//! Fallback pipeline for rejected candidates.
//!
//! When the guard rejects a candidate, the pipeline asks each registered
//! strategy for an alternative, in registration order, and commits the first
//! one the guard allows. If none is allowed, an emergency prefix is applied
//! and the result is returned without being checked or committed.

use crate::models::ConversationContext;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use super::guard::DuplicateGuard;
use super::similarity::SimilarityScorer;

/// Prefixes of the strategies registered by [`FallbackPipeline::new`].
pub const DEFAULT_STRATEGY_PREFIXES: [&str; 3] = [
    "To express this differently: ",
    "Let me rephrase that: ",
    "From another perspective: ",
];

/// Prefixes the emergency fallback picks from.
pub const EMERGENCY_PREFIXES: [&str; 3] = [
    "Alternatively, ",
    "To put it another way, ",
    "In other words, ",
];

/// Produces an alternative phrasing of a rejected candidate.
///
/// Implementations must not touch shared state; the pipeline decides what
/// gets committed. A strategy that calls out to a generator blocks the
/// pipeline for the duration of the call.
pub trait FallbackStrategy: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generates an alternative to `original`.
    ///
    /// # Errors
    ///
    /// Returns an error if no alternative can be produced. The pipeline
    /// stops and surfaces it as [`Error::StrategyFailed`].
    fn generate_alternative(
        &self,
        original: &str,
        context: Option<&ConversationContext>,
    ) -> Result<String>;
}

/// Strategy that prepends a fixed phrase.
///
/// # Example
///
/// ```rust
/// use echoguard::{FallbackStrategy, PrefixStrategy};
///
/// let strategy = PrefixStrategy::new("Let me rephrase that: ");
/// let alternative = strategy.generate_alternative("hi", None)?;
/// assert_eq!(alternative, "Let me rephrase that: hi");
/// # Ok::<(), echoguard::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixStrategy {
    prefix: String,
}

impl PrefixStrategy {
    /// Creates a prefix strategy.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl FallbackStrategy for PrefixStrategy {
    fn name(&self) -> &str {
        self.prefix.trim_end()
    }

    fn generate_alternative(
        &self,
        original: &str,
        _context: Option<&ConversationContext>,
    ) -> Result<String> {
        Ok(format!("{}{original}", self.prefix))
    }
}

/// Strategy backed by a closure.
///
/// # Example
///
/// ```rust
/// use echoguard::services::FnStrategy;
/// use echoguard::FallbackStrategy;
///
/// let shout = FnStrategy::new("shout", |original: &str, _ctx: Option<&echoguard::ConversationContext>| {
///     Ok(original.to_uppercase())
/// });
/// assert_eq!(shout.generate_alternative("hi", None)?, "HI");
/// # Ok::<(), echoguard::Error>(())
/// ```
pub struct FnStrategy<F> {
    name: String,
    generate: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&str, Option<&ConversationContext>) -> Result<String> + Send + Sync,
{
    /// Wraps a closure as a named strategy.
    #[must_use]
    pub fn new(name: impl Into<String>, generate: F) -> Self {
        Self {
            name: name.into(),
            generate,
        }
    }
}

impl<F> FallbackStrategy for FnStrategy<F>
where
    F: Fn(&str, Option<&ConversationContext>) -> Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_alternative(
        &self,
        original: &str,
        context: Option<&ConversationContext>,
    ) -> Result<String> {
        (self.generate)(original, context)
    }
}

/// Where a fallback response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackSource {
    /// A registered strategy, by name. The response was committed.
    Strategy(String),
    /// The emergency prefix. The response was not committed.
    Emergency,
}

/// A resolved fallback response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// The response to emit.
    pub response: String,
    /// Which path produced it.
    pub source: FallbackSource,
}

/// Ordered list of fallback strategies plus the emergency fallback.
///
/// The emergency prefix is drawn from an owned, seedable RNG so tests can
/// make it deterministic.
pub struct FallbackPipeline {
    strategies: Vec<Box<dyn FallbackStrategy>>,
    rng: StdRng,
}

impl FallbackPipeline {
    /// Creates a pipeline with the default prefix strategies and an
    /// OS-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_defaults(StdRng::from_os_rng())
    }

    /// Creates a pipeline with the default prefix strategies and a
    /// deterministic RNG.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_defaults(StdRng::seed_from_u64(seed))
    }

    /// Creates a pipeline with no strategies. Every resolution goes
    /// straight to the emergency fallback until strategies are added.
    #[must_use]
    pub fn empty(seed: Option<u64>) -> Self {
        Self {
            strategies: Vec::new(),
            rng: seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64),
        }
    }

    fn with_defaults(rng: StdRng) -> Self {
        let strategies = DEFAULT_STRATEGY_PREFIXES
            .iter()
            .map(|prefix| Box::new(PrefixStrategy::new(*prefix)) as Box<dyn FallbackStrategy>)
            .collect();
        Self { strategies, rng }
    }

    /// Appends a strategy. It is tried after every strategy already
    /// registered, starting with the next resolution.
    pub fn add_strategy(&mut self, strategy: impl FallbackStrategy + 'static) {
        self.add_boxed(Box::new(strategy));
    }

    /// Appends an already boxed strategy.
    pub fn add_boxed(&mut self, strategy: Box<dyn FallbackStrategy>) {
        tracing::debug!(strategy = strategy.name(), "Registered fallback strategy");
        self.strategies.push(strategy);
    }

    /// Removes every strategy. Idempotent.
    pub fn clear_strategies(&mut self) {
        self.strategies.clear();
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Names of the registered strategies, in order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves a rejected candidate and returns the response to emit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StrategyFailed`] if a strategy fails.
    pub fn resolve<S: SimilarityScorer>(
        &mut self,
        guard: &mut DuplicateGuard<S>,
        original: &str,
        context: Option<&ConversationContext>,
    ) -> Result<String> {
        self.resolve_outcome(guard, original, context)
            .map(|outcome| outcome.response)
    }

    /// Resolves a rejected candidate, reporting which path produced it.
    ///
    /// Strategies are tried in order. The first alternative the guard allows
    /// is committed and returned. If none is allowed, the emergency prefix is
    /// applied and returned unchecked and uncommitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StrategyFailed`] if a strategy fails. History is not
    /// modified by the failing attempt.
    #[instrument(
        skip(self, guard, original, context),
        fields(operation = "fallback_resolve", strategies = self.strategies.len())
    )]
    pub fn resolve_outcome<S: SimilarityScorer>(
        &mut self,
        guard: &mut DuplicateGuard<S>,
        original: &str,
        context: Option<&ConversationContext>,
    ) -> Result<FallbackOutcome> {
        for strategy in &self.strategies {
            let alternative = strategy
                .generate_alternative(original, context)
                .map_err(|e| {
                    tracing::warn!(strategy = strategy.name(), error = %e, "Fallback strategy failed");
                    Error::StrategyFailed {
                        strategy: strategy.name().to_string(),
                        cause: e.to_string(),
                    }
                })?;

            if guard.is_allowed(&alternative) {
                tracing::debug!(strategy = strategy.name(), "Fallback alternative accepted");
                guard.commit(alternative.clone());
                return Ok(FallbackOutcome {
                    response: alternative,
                    source: FallbackSource::Strategy(strategy.name().to_string()),
                });
            }

            tracing::debug!(strategy = strategy.name(), "Fallback alternative also rejected");
        }

        let response = self.emergency_fallback(original);
        tracing::info!("All fallback strategies collided, using emergency fallback");
        Ok(FallbackOutcome {
            response,
            source: FallbackSource::Emergency,
        })
    }

    /// Applies a randomly chosen emergency prefix.
    pub fn emergency_fallback(&mut self, original: &str) -> String {
        let prefix = EMERGENCY_PREFIXES[self.rng.random_range(0..EMERGENCY_PREFIXES.len())];
        format!("{prefix}{original}")
    }
}

impl Default for FallbackPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FallbackPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackPipeline")
            .field("strategies", &self.strategy_names())
            .finish_non_exhaustive()
    }
}
