//! Integration tests for the duplicate guard and response processor.
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::too_many_lines,
    clippy::float_cmp
)]

use echoguard::services::{EMERGENCY_PREFIXES, FallbackSource, FnStrategy, ProcessOutcome};
use echoguard::{
    ConversationContext, DuplicateGuard, Error, GuardConfig, LevenshteinScorer, PrefixStrategy,
    ResponseProcessor,
};
use std::sync::{Arc, Mutex};
use std::thread;

fn config(window: usize, threshold: f64) -> GuardConfig {
    GuardConfig::new(window, threshold).unwrap()
}

// ============================================================================
// Guard scenarios
// ============================================================================

#[test]
fn test_window_eviction_scenario() {
    let mut guard = DuplicateGuard::new(config(3, 0.8));
    guard.commit("One");
    guard.commit("Two");
    guard.commit("Three");

    assert!(!guard.is_allowed("One"), "still inside the window");

    guard.commit("Four");

    assert!(guard.is_allowed("One"), "evicted by Four");
    let contents: Vec<String> = guard.history().into_iter().map(|r| r.content).collect();
    assert_eq!(contents, vec!["Two", "Three", "Four"]);
}

#[test]
fn test_near_identical_scenario() {
    let mut guard = DuplicateGuard::new(config(3, 0.8));
    guard.commit("Hello there!");

    assert!(!guard.is_allowed("Hello there"));
}

#[test]
fn test_empty_history_scenario() {
    let mut guard = DuplicateGuard::new(config(3, 0.8));

    assert!(guard.is_allowed("anything"));
    assert_eq!(guard.similarity_to_last("anything"), 0.0);
}

#[test]
fn test_window_plus_k_keeps_last_window() {
    let window = 4;
    let k = 3;
    let items: Vec<String> = (0..window + k).map(|i| format!("{i:03}-{}", "x".repeat(i))).collect();
    let mut guard = DuplicateGuard::new(config(window, 1.0));

    for item in &items {
        guard.commit(item.as_str());
    }

    let contents: Vec<String> = guard.history().into_iter().map(|r| r.content).collect();
    assert_eq!(contents, items[k..].to_vec());
    // The k-th earliest entry was evicted and is allowed again.
    assert!(guard.is_allowed(&items[k - 1]));
}

#[test]
fn test_levenshtein_guard_end_to_end() {
    let guard = DuplicateGuard::with_scorer(config(3, 0.9), LevenshteinScorer);
    let mut processor = ResponseProcessor::from_parts(
        guard,
        echoguard::FallbackPipeline::with_seed(5),
    );

    assert_eq!(processor.process("kitten", None).unwrap(), "kitten");
    assert_eq!(processor.process("sitting", None).unwrap(), "sitting");
    assert_ne!(processor.process("kitten", None).unwrap(), "kitten");
}

// ============================================================================
// Processor scenarios
// ============================================================================

#[test]
fn test_repeated_candidate_walks_strategies_then_emergency() {
    let mut processor = ResponseProcessor::with_seed(config(5, 0.8), 11);
    let candidate = "The quick brown fox";

    let outcomes: Vec<ProcessOutcome> = (0..5)
        .map(|_| processor.process_outcome(candidate, None).unwrap())
        .collect();

    assert_eq!(outcomes[0], ProcessOutcome::Accepted(candidate.to_string()));
    assert_eq!(
        outcomes[1].response(),
        "To express this differently: The quick brown fox"
    );
    assert_eq!(outcomes[2].response(), "Let me rephrase that: The quick brown fox");
    assert_eq!(
        outcomes[3].response(),
        "From another perspective: The quick brown fox"
    );
    match &outcomes[4] {
        ProcessOutcome::Fallback(outcome) => {
            assert_eq!(outcome.source, FallbackSource::Emergency);
            assert!(
                EMERGENCY_PREFIXES
                    .iter()
                    .any(|p| outcome.response == format!("{p}{candidate}"))
            );
        },
        other => panic!("expected emergency fallback, got {other:?}"),
    }

    let metrics = processor.metrics();
    assert_eq!(metrics.total_responses, 5);
    assert_eq!(metrics.duplicates_detected, 4);
    assert_eq!(metrics.unique_responses, 1);
    // Emergency output is not committed.
    assert_eq!(processor.history().len(), 4);
}

#[test]
fn test_seeded_processors_agree() {
    let run = |seed| {
        let mut processor = ResponseProcessor::with_seed(config(5, 0.0), seed);
        processor.clear_fallback_strategies();
        (0..8)
            .map(|i| processor.process(&format!("reply {i}"), None).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(99), run(99));
}

#[test]
fn test_context_reaches_custom_strategy() {
    let mut processor = ResponseProcessor::with_seed(config(5, 0.8), 1);
    processor.clear_fallback_strategies();
    processor.add_fallback_strategy(FnStrategy::new(
        "tone",
        |original: &str, ctx: Option<&ConversationContext>| {
            let tone = ctx.and_then(|c| c.preference_str("tone")).unwrap_or("plain");
            Ok(format!("[{tone}] #{}", original.len()))
        },
    ));
    let context = ConversationContext::new().with_preference("tone", "technical");

    processor.process("Same answer", Some(&context)).unwrap();
    let response = processor.process("Same answer", Some(&context)).unwrap();

    assert_eq!(response, "[technical] #11");
}

#[test]
fn test_strategies_added_later_apply_to_later_calls() {
    let mut processor = ResponseProcessor::with_seed(config(5, 0.8), 1);
    processor.clear_fallback_strategies();
    processor.process("hello world", None).unwrap();

    let first = processor.process_outcome("hello world", None).unwrap();
    assert!(matches!(
        first,
        ProcessOutcome::Fallback(ref o) if o.source == FallbackSource::Emergency
    ));

    processor.add_fallback_strategy(PrefixStrategy::new("Put differently: "));
    let second = processor.process("hello world", None).unwrap();
    assert_eq!(second, "Put differently: hello world");
}

#[test]
fn test_failing_strategy_does_not_corrupt_history() {
    let mut processor = ResponseProcessor::with_seed(config(5, 0.8), 1);
    processor.clear_fallback_strategies();
    processor.add_fallback_strategy(FnStrategy::new(
        "generator",
        |_: &str, _: Option<&ConversationContext>| {
            Err(Error::OperationFailed {
                operation: "generate".to_string(),
                cause: "upstream unavailable".to_string(),
            })
        },
    ));
    processor.process("status report", None).unwrap();
    let before = processor.history();

    let err = processor.process("status report", None).unwrap_err();

    assert!(err.to_string().contains("generator"));
    assert!(err.to_string().contains("upstream unavailable"));
    assert_eq!(processor.history(), before);
}

#[test]
fn test_processor_shared_behind_mutex() {
    let processor = Arc::new(Mutex::new(ResponseProcessor::with_seed(config(100, 0.8), 3)));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let processor = Arc::clone(&processor);
            thread::spawn(move || {
                for i in 0..10 {
                    let mut guard = processor.lock().unwrap();
                    guard
                        .process(&format!("thread {t} message {i}"), None)
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let metrics = processor.lock().unwrap().metrics();
    assert_eq!(metrics.total_responses, 40);
    assert!(metrics.duplicates_detected <= metrics.total_responses);
    assert!((0.0..=1.0).contains(&metrics.average_similarity));
}

#[test]
fn test_config_file_drives_processor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "repetition_window = 3\nsimilarity_threshold = 0.8\n").unwrap();

    let config = echoguard::EchoguardConfig::load_from_file(&path).unwrap();
    let mut processor = ResponseProcessor::new(config.guard);

    for item in ["One", "Two", "Three", "Four"] {
        processor.add_response(item);
    }

    assert!(processor.is_response_allowed("One"));
    assert!(!processor.is_response_allowed("Four"));
}
