//! # Signer Module
//!
//! Wires the concrete stages into one run:
//!
//! ```text
//! source -> single_hash -> multi_hash -> combine_results
//! ```
//!
//! A fresh exclusive [`Quota`] is created for every run and handed to the
//! stages: at most one slow digest call is in flight per run, and two
//! signers never share that slot.

mod input;

pub use input::{parse_values, read_values};

use crate::core::digest::{Digest, DigestAlgorithmKind, DigestConfig};
use crate::core::pipeline::{Pipeline, DEFAULT_QUEUE_CAPACITY};
use crate::core::quota::Quota;
use crate::core::stages::{CombineResults, MultiHash, SingleHash, ValuesSource};
use crate::error::{Result, SignerError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of one signing run
#[derive(Debug, Clone, Serialize)]
pub struct SignerResult {
    /// Identifier of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// The combined signature
    pub combined: String,
    /// Number of input values
    pub total_inputs: usize,
    /// Number of slow digest calls made
    pub slow_calls: usize,
    /// Highest number of slow digest calls in flight at once
    pub peak_slow_concurrency: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the signer
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Capacity of each queue between stages
    pub queue_capacity: usize,
    /// Algorithm for the fast digest
    pub fast: DigestAlgorithmKind,
    /// Algorithm for the slow digest
    pub slow: DigestAlgorithmKind,
    /// Artificial delay per fast digest call
    pub fast_latency: Duration,
    /// Artificial delay per slow digest call
    pub slow_latency: Duration,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            fast: DigestAlgorithmKind::Crc32,
            slow: DigestAlgorithmKind::Md5,
            fast_latency: Duration::ZERO,
            slow_latency: Duration::ZERO,
        }
    }
}

impl SignerConfig {
    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(SignerError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for signer configuration
pub struct SignerBuilder {
    config: SignerConfig,
    fast: Option<Arc<dyn Digest>>,
    slow: Option<Arc<dyn Digest>>,
    events: Option<EventSender>,
}

impl SignerBuilder {
    /// Create a new signer builder
    pub fn new() -> Self {
        Self {
            config: SignerConfig::default(),
            fast: None,
            slow: None,
            events: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: SignerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the capacity of the queues between stages
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the fast digest algorithm
    pub fn fast_algorithm(mut self, algorithm: DigestAlgorithmKind) -> Self {
        self.config.fast = algorithm;
        self
    }

    /// Set the slow digest algorithm
    pub fn slow_algorithm(mut self, algorithm: DigestAlgorithmKind) -> Self {
        self.config.slow = algorithm;
        self
    }

    /// Delay every fast digest call
    pub fn fast_latency(mut self, latency: Duration) -> Self {
        self.config.fast_latency = latency;
        self
    }

    /// Delay every slow digest call
    pub fn slow_latency(mut self, latency: Duration) -> Self {
        self.config.slow_latency = latency;
        self
    }

    /// Use a custom fast digest instead of a built-in algorithm
    pub fn fast_digest(mut self, digest: Arc<dyn Digest>) -> Self {
        self.fast = Some(digest);
        self
    }

    /// Use a custom slow digest instead of a built-in algorithm
    pub fn slow_digest(mut self, digest: Arc<dyn Digest>) -> Self {
        self.slow = Some(digest);
        self
    }

    /// Publish progress events to `events`
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the signer
    pub fn build(self) -> Result<Signer> {
        self.config.validate()?;

        let config = self.config;
        let fast = self.fast.unwrap_or_else(|| {
            DigestConfig::new(config.fast)
                .latency(config.fast_latency)
                .build()
        });
        let slow = self.slow.unwrap_or_else(|| {
            DigestConfig::new(config.slow)
                .latency(config.slow_latency)
                .build()
        });

        Ok(Signer {
            config,
            fast,
            slow,
            events: self.events.unwrap_or_else(null_sender),
        })
    }
}

impl Default for SignerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the signing pipeline
pub struct Signer {
    config: SignerConfig,
    fast: Arc<dyn Digest>,
    slow: Arc<dyn Digest>,
    events: EventSender,
}

impl Signer {
    /// Create a new signer builder
    pub fn builder() -> SignerBuilder {
        SignerBuilder::new()
    }

    /// The active configuration
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Run the pipeline over `values` and return the combined signature.
    ///
    /// Any stage failure aborts the run; no partial signature is returned.
    pub fn sign(&self, values: &[i64]) -> Result<SignerResult> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let quota = Arc::new(Quota::exclusive());

        tracing::info!(
            "Signing {} values (fast: {}, slow: {}, run {})",
            values.len(),
            self.fast.name(),
            self.slow.name(),
            run_id
        );

        let pipeline = Pipeline::builder(ValuesSource::new(values.to_vec()))
            .then(SingleHash::new(
                self.fast.clone(),
                self.slow.clone(),
                quota.clone(),
            ))
            .then(MultiHash::new(self.fast.clone()))
            .then(CombineResults::new())
            .queue_capacity(self.config.queue_capacity)
            .events(self.events.clone())
            .build();

        self.events.send(Event::Pipeline(PipelineEvent::Started {
            run_id,
            stages: pipeline.stage_names().to_vec(),
        }));

        let mut outputs = match pipeline.run() {
            Ok(outputs) => outputs,
            Err(e) => {
                self.events.send(Event::Pipeline(PipelineEvent::Failed {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        if outputs.len() != 1 {
            return Err(SignerError::MissingOutput {
                received: outputs.len(),
            });
        }
        let combined = outputs.remove(0);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let summary = PipelineSummary {
            run_id,
            total_inputs: values.len(),
            peak_slow_concurrency: quota.peak(),
            duration_ms,
        };
        self.events
            .send(Event::Pipeline(PipelineEvent::Completed { summary }));

        tracing::info!("Run {} finished in {}ms", run_id, duration_ms);

        Ok(SignerResult {
            run_id,
            started_at,
            combined,
            total_inputs: values.len(),
            slow_calls: quota.grants(),
            peak_slow_concurrency: quota.peak(),
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_builder_applies_settings() {
        let signer = Signer::builder()
            .queue_capacity(4)
            .fast_algorithm(DigestAlgorithmKind::Xxh3)
            .build()
            .unwrap();

        assert_eq!(signer.config().queue_capacity, 4);
        assert_eq!(signer.config().fast, DigestAlgorithmKind::Xxh3);
        assert_eq!(signer.config().slow, DigestAlgorithmKind::Md5);
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let result = Signer::builder().queue_capacity(0).build();
        assert!(matches!(result, Err(SignerError::Config(_))));
    }

    #[test]
    fn slow_digest_is_exclusive_under_latency() {
        let signer = Signer::builder()
            .slow_latency(Duration::from_millis(2))
            .build()
            .unwrap();

        let values: Vec<i64> = (0..8).collect();
        let result = signer.sign(&values).unwrap();

        assert_eq!(result.slow_calls, 8);
        assert_eq!(result.peak_slow_concurrency, 1);
    }

    #[test]
    fn signer_handles_empty_input() {
        let result = Signer::builder().build().unwrap().sign(&[]).unwrap();

        assert_eq!(result.combined, "");
        assert_eq!(result.total_inputs, 0);
        assert_eq!(result.slow_calls, 0);
    }

    #[test]
    fn signer_counts_slow_calls() {
        let result = Signer::builder().build().unwrap().sign(&[0, 1, 2]).unwrap();

        assert_eq!(result.slow_calls, 3);
        assert_eq!(result.peak_slow_concurrency, 1);
    }
}
