//! Binary entry point for echoguard.
//!
//! A small CLI around the library: feed it candidate responses and it prints
//! what would actually be emitted.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow printing in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use echoguard::config::EchoguardConfig;
use echoguard::observability;
use echoguard::services::{ProcessOutcome, jaro_winkler};
use echoguard::{GuardConfig, ResponseProcessor};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

/// Echoguard - near-duplicate suppression for generated responses.
#[derive(Parser)]
#[command(name = "echoguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of recent responses checked for repetition.
    #[arg(short, long, global = true)]
    window: Option<usize>,

    /// Similarity at or above which a response is a duplicate (0.0 - 1.0).
    #[arg(short, long, global = true)]
    threshold: Option<f64>,

    /// Seed for the emergency fallback prefix.
    #[arg(long, global = true, env = "ECHOGUARD_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Process responses and print what would be emitted.
    ///
    /// Reads one response per line from stdin when none are given.
    Process {
        /// Candidate responses, in order.
        responses: Vec<String>,

        /// Mark responses that went through the fallback pipeline.
        #[arg(long)]
        annotate: bool,
    },

    /// Print the Jaro-Winkler similarity of two strings.
    Score {
        /// First string.
        a: String,
        /// Second string.
        b: String,
    },

    /// Process responses and print the resulting metrics as JSON.
    Metrics {
        /// Candidate responses, in order.
        responses: Vec<String>,
    },

    /// Show the effective configuration.
    Config,
}

fn main() -> ExitCode {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = config.logging.to_logging_config(cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration: defaults, then file, then environment, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<EchoguardConfig> {
    let config = match &cli.config {
        Some(path) => EchoguardConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EchoguardConfig::load_default(),
    };

    let mut config = config
        .with_env_overrides()
        .context("applying ECHOGUARD_* environment overrides")?;

    config.guard = apply_flags(config.guard, cli.window, cli.threshold)?;
    Ok(config)
}

/// Applies command-line overrides to the guard settings.
fn apply_flags(
    guard: GuardConfig,
    window: Option<usize>,
    threshold: Option<f64>,
) -> anyhow::Result<GuardConfig> {
    let mut guard = guard;
    if let Some(window) = window {
        guard = guard
            .with_repetition_window(window)
            .context("--window")?;
    }
    if let Some(threshold) = threshold {
        guard = guard
            .with_similarity_threshold(threshold)
            .context("--threshold")?;
    }
    Ok(guard)
}

/// Runs the selected command.
fn run_command(cli: Cli, config: EchoguardConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Process {
            responses,
            annotate,
        } => cmd_process(&config, cli.seed, responses, annotate),
        Commands::Score { a, b } => {
            println!("{:.4}", jaro_winkler(&a, &b));
            Ok(())
        },
        Commands::Metrics { responses } => cmd_metrics(&config, cli.seed, responses),
        Commands::Config => cmd_config(&config),
    }
}

fn build_processor(config: &EchoguardConfig, seed: Option<u64>) -> ResponseProcessor {
    match seed {
        Some(seed) => ResponseProcessor::with_seed(config.guard, seed),
        None => ResponseProcessor::new(config.guard),
    }
}

/// Returns the given responses, or stdin lines when none were given.
fn collect_inputs(responses: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !responses.is_empty() {
        return Ok(responses);
    }

    std::io::stdin()
        .lock()
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .collect::<Result<Vec<_>, _>>()
        .context("reading responses from stdin")
}

fn cmd_process(
    config: &EchoguardConfig,
    seed: Option<u64>,
    responses: Vec<String>,
    annotate: bool,
) -> anyhow::Result<()> {
    let mut processor = build_processor(config, seed);

    for candidate in collect_inputs(responses)? {
        let outcome = processor.process_outcome(&candidate, None)?;
        match (&outcome, annotate) {
            (ProcessOutcome::Fallback(_), true) => println!("* {}", outcome.response()),
            (ProcessOutcome::Accepted(_), true) => println!("  {}", outcome.response()),
            (_, false) => println!("{}", outcome.response()),
        }
    }

    Ok(())
}

fn cmd_metrics(
    config: &EchoguardConfig,
    seed: Option<u64>,
    responses: Vec<String>,
) -> anyhow::Result<()> {
    let mut processor = build_processor(config, seed);

    for candidate in collect_inputs(responses)? {
        processor.process(&candidate, None)?;
    }

    let json = serde_json::to_string_pretty(&processor.metrics())?;
    println!("{json}");
    Ok(())
}

fn cmd_config(config: &EchoguardConfig) -> anyhow::Result<()> {
    println!(
        "repetition_window    = {}",
        config.guard.repetition_window()
    );
    println!(
        "similarity_threshold = {}",
        config.guard.similarity_threshold()
    );
    if let Some(level) = &config.logging.level {
        println!("logging.level        = {level}");
    }
    if let Some(format) = config.logging.format {
        println!("logging.format       = {format:?}");
    }
    Ok(())
}
