//! # CLI Module
//!
//! Command-line interface for the hash signer.
//!
//! ## Usage
//! ```bash
//! # Sign a few values
//! hash-signer sign 0 1 1 2 3 5 8
//!
//! # Values from a file, JSON output
//! hash-signer sign --from-file values.txt --output json
//!
//! # Simulate expensive digests to watch the quota at work
//! hash-signer sign 0 1 2 --slow-latency-ms 10 --fast-latency-ms 1000 --verbose
//!
//! # List digest algorithms
//! hash-signer algorithms
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use hash_signer::core::digest::DigestAlgorithmKind;
use hash_signer::core::signer::{read_values, Signer, SignerResult};
use hash_signer::core::stages::MultiHash;
use hash_signer::error::Result;
use hash_signer::events::{Event, EventChannel, PipelineEvent, StageEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Hash Signer - layered digests through a concurrent pipeline
#[derive(Parser, Debug)]
#[command(name = "hash-signer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the combined signature of a list of integers
    Sign {
        /// Values to sign
        #[arg(allow_negative_numbers = true)]
        values: Vec<i64>,

        /// Read additional values from a file (whitespace or comma separated)
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Fast digest algorithm
        #[arg(long, default_value = "crc32")]
        fast: Algorithm,

        /// Slow digest algorithm
        #[arg(long, default_value = "md5")]
        slow: Algorithm,

        /// Capacity of each queue between stages
        #[arg(long, default_value = "10")]
        queue_capacity: usize,

        /// Artificial delay per fast digest call, in milliseconds
        #[arg(long, default_value = "0")]
        fast_latency_ms: u64,

        /// Artificial delay per slow digest call, in milliseconds
        #[arg(long, default_value = "0")]
        slow_latency_ms: u64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the available digest algorithms
    Algorithms,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// CRC-32, decimal
    Crc32,
    /// MD5, hex
    Md5,
    /// XXH3 64-bit, hex
    Xxh3,
}

impl From<Algorithm> for DigestAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Crc32 => DigestAlgorithmKind::Crc32,
            Algorithm::Md5 => DigestAlgorithmKind::Md5,
            Algorithm::Xxh3 => DigestAlgorithmKind::Xxh3,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// The signature only
    Minimal,
}

/// Options for one `sign` invocation
struct SignOptions {
    values: Vec<i64>,
    from_file: Option<PathBuf>,
    fast: DigestAlgorithmKind,
    slow: DigestAlgorithmKind,
    queue_capacity: usize,
    fast_latency: Duration,
    slow_latency: Duration,
    output: OutputFormat,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign {
            values,
            from_file,
            fast,
            slow,
            queue_capacity,
            fast_latency_ms,
            slow_latency_ms,
            output,
            verbose,
        } => {
            hash_signer::init_tracing(if verbose { "debug" } else { "warn" });
            run_sign(SignOptions {
                values,
                from_file,
                fast: fast.into(),
                slow: slow.into(),
                queue_capacity,
                fast_latency: Duration::from_millis(fast_latency_ms),
                slow_latency: Duration::from_millis(slow_latency_ms),
                output,
                verbose,
            })
        }
        Commands::Algorithms => {
            print_algorithms();
            Ok(())
        }
    }
}

fn run_sign(options: SignOptions) -> Result<()> {
    let term = Term::stderr();

    let mut values = options.values;
    if let Some(path) = &options.from_file {
        values.extend(read_values(path)?);
    }

    if matches!(options.output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Hash Signer").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let (sender, receiver) = EventChannel::new();

    let signer = Signer::builder()
        .fast_algorithm(options.fast)
        .slow_algorithm(options.slow)
        .fast_latency(options.fast_latency)
        .slow_latency(options.slow_latency)
        .queue_capacity(options.queue_capacity)
        .events(sender)
        .build()?;

    // Progress bar for pretty output
    let progress = if matches!(options.output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(values.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = options.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Stage(StageEvent::ItemProcessed(p)) if p.stage == MultiHash::NAME => {
                    pb.set_position(p.completed as u64);
                }
                Event::Stage(stage_event) => {
                    if verbose {
                        pb.set_message(stage_event.to_string());
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = signer.sign(&values);

    // Drop the signer (and its sender) so the event thread finishes
    drop(signer);
    event_thread.join().ok();

    let result = result?;

    match options.output {
        OutputFormat::Pretty => print_pretty_result(&term, &result, verbose),
        OutputFormat::Json => print_json_result(&result),
        OutputFormat::Minimal => println!("{}", result.combined),
    }

    Ok(())
}

fn print_pretty_result(term: &Term, result: &SignerResult, verbose: bool) {
    term.write_line(&format!("{} Signing Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} values signed in {:.3}s",
        style(result.total_inputs).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} slow digest calls (peak concurrency {})",
        style(result.slow_calls).cyan(),
        style(result.peak_slow_concurrency).yellow()
    ))
    .ok();

    if verbose {
        term.write_line(&format!("  {} {}", style("Run:").dim(), result.run_id))
            .ok();
    }

    term.write_line("").ok();
    println!("{}", result.combined);
}

fn print_json_result(result: &SignerResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize result: {}", e),
    }
}

fn print_algorithms() {
    for kind in DigestAlgorithmKind::ALL {
        println!("{:<6} {}", kind.to_string(), kind.description());
    }
}
