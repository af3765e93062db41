//! Event type definitions for progress reporting.

use serde::Serialize;
use uuid::Uuid;

/// All events emitted while a pipeline runs
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    /// Per-stage lifecycle and progress events
    Stage(StageEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Lifecycle of one stage: Running -> Draining -> Closed
#[derive(Debug, Clone, Serialize)]
pub enum StageEvent {
    /// Stage thread started and is accepting input
    Started { stage: &'static str },
    /// Input closed; waiting for in-flight workers
    Draining { stage: &'static str, in_flight: usize },
    /// One item finished and was written downstream
    ItemProcessed(StageProgress),
    /// Stage returned and its output queue is closed
    Completed { stage: &'static str, emitted: usize },
}

/// Progress information for a single stage
#[derive(Debug, Clone, Serialize)]
pub struct StageProgress {
    /// Name of the stage
    pub stage: &'static str,
    /// Items emitted by this stage so far
    pub completed: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize)]
pub enum PipelineEvent {
    /// The pipeline started all of its stages
    Started { run_id: Uuid, stages: Vec<&'static str> },
    /// The pipeline finished successfully
    Completed { summary: PipelineSummary },
    /// The pipeline aborted
    Failed { message: String },
}

/// Summary statistics for a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    /// Identifier of this run
    pub run_id: Uuid,
    /// Number of values fed in by the source
    pub total_inputs: usize,
    /// Highest number of concurrent slow digest calls observed
    pub peak_slow_concurrency: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for StageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageEvent::Started { stage } => write!(f, "{} running", stage),
            StageEvent::Draining { stage, in_flight } => {
                write!(f, "{} draining ({} in flight)", stage, in_flight)
            }
            StageEvent::ItemProcessed(p) => write!(f, "{} emitted {}", p.stage, p.completed),
            StageEvent::Completed { stage, emitted } => {
                write!(f, "{} closed after {} items", stage, emitted)
            }
        }
    }
}
