//! # Error Module
//!
//! Error types for the hash signer.
//!
//! ## Design Principles
//! - **Never panic** on bad input - return errors instead
//! - **Include context** - which stage, which value, what went wrong
//! - **Whole-run failure** - a failing stage aborts the run, no partial output

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected exactly one combined result, got {received}")]
    MissingOutput { received: usize },
}

/// Errors raised by a single stage while processing its input
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Stage '{stage}' collected {received} of {expected} fan-in results")]
    IncompleteFanIn {
        stage: &'static str,
        expected: usize,
        received: usize,
    },

    #[error("Stage '{stage}' could not emit: downstream queue is closed")]
    DownstreamClosed { stage: &'static str },

    #[error("A worker in stage '{stage}' panicked")]
    WorkerPanicked { stage: &'static str },

    #[error("Failed to start a worker in stage '{stage}': {source}")]
    WorkerSpawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    /// Whether this failure is only a consequence of another stage failing.
    ///
    /// A stage sees `DownstreamClosed` after its consumer has already died.
    pub fn is_secondary(&self) -> bool {
        matches!(self, StageError::DownstreamClosed { .. })
    }
}

/// Errors raised by the pipeline executor
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Stage(#[from] StageError),

    #[error("Stage '{stage}' panicked")]
    StagePanicked { stage: &'static str },

    #[error("Failed to start stage '{stage}': {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether this failure is only a consequence of another stage failing.
    pub fn is_secondary(&self) -> bool {
        match self {
            PipelineError::Stage(e) => e.is_secondary(),
            _ => false,
        }
    }
}

/// Errors while reading the source values
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid input value '{value}' on line {line}: expected an integer")]
    InvalidValue { value: String, line: usize },

    #[error("Failed to read input file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SignerError>;
