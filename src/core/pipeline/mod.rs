//! # Pipeline Module
//!
//! A generic executor that chains stages through bounded queues.
//!
//! ## Model
//! 1. A [`Source`] writes the raw items into the first queue
//! 2. Each [`Stage`] reads the previous queue and writes its own
//! 3. The executor drains the last queue and joins every stage
//!
//! Every stage runs on its own thread from the moment the run starts.
//! Queues are bounded, so a fast producer blocks until its consumer catches
//! up. A stage closes its output by returning.

mod executor;
mod stage;

pub use executor::{Pipeline, PipelineBuilder, DEFAULT_QUEUE_CAPACITY};
pub use stage::{for_each_concurrent, spawn_worker, Source, Stage, StageContext};
