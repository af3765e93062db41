//! Pipeline execution implementation.

use super::stage::{Source, Stage, StageContext};
use crate::error::{PipelineError, StageError};
use crate::events::{null_sender, EventSender};
use crossbeam_channel::{bounded, Receiver};
use std::thread::{self, JoinHandle};

/// Default capacity of every intermediate queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// A stage thread that was (or failed to be) started
struct Launched {
    name: &'static str,
    handle: std::io::Result<JoinHandle<Result<usize, StageError>>>,
}

/// Creates the queues and starts the stage threads for one run; returns the
/// receiving end of the last queue.
type Wiring<T> = Box<dyn FnOnce(usize, &EventSender, &mut Vec<Launched>) -> Receiver<T> + Send>;

/// Builder for a typed chain of stages.
///
/// Each `then` call checks at compile time that the new stage reads what
/// the previous one writes.
pub struct PipelineBuilder<T> {
    wiring: Wiring<T>,
    stage_names: Vec<&'static str>,
    queue_capacity: usize,
    events: EventSender,
}

impl<T: Send + 'static> PipelineBuilder<T> {
    /// Start a pipeline at `source`
    pub fn from_source<S>(source: S) -> Self
    where
        S: Source<Output = T>,
    {
        let name = source.name();
        let wiring: Wiring<T> = Box::new(
            move |capacity: usize, events: &EventSender, launched: &mut Vec<Launched>| {
                let (tx, rx) = bounded(capacity);
                let events = events.clone();
                let handle = thread::Builder::new()
                    .name(format!("stage-{}", name))
                    .spawn(move || {
                        let ctx = StageContext::new(name, events);
                        ctx.started();
                        let result = source.emit(tx, &ctx);
                        finish(&ctx, &result);
                        result
                    });
                launched.push(Launched { name, handle });
                rx
            },
        );

        Self {
            wiring,
            stage_names: vec![name],
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            events: null_sender(),
        }
    }

    /// Append `stage`, fed by the current last stage
    pub fn then<S>(self, stage: S) -> PipelineBuilder<S::Output>
    where
        S: Stage<Input = T>,
    {
        let name = stage.name();
        let upstream = self.wiring;
        let wiring: Wiring<S::Output> = Box::new(
            move |capacity: usize, events: &EventSender, launched: &mut Vec<Launched>| {
                let input = upstream(capacity, events, launched);
                let (tx, rx) = bounded(capacity);
                let events = events.clone();
                let handle = thread::Builder::new()
                    .name(format!("stage-{}", name))
                    .spawn(move || {
                        let ctx = StageContext::new(name, events);
                        ctx.started();
                        let result = stage.process(input, tx, &ctx);
                        finish(&ctx, &result);
                        result
                    });
                launched.push(Launched { name, handle });
                rx
            },
        );

        let mut stage_names = self.stage_names;
        stage_names.push(name);

        PipelineBuilder {
            wiring,
            stage_names,
            queue_capacity: self.queue_capacity,
            events: self.events,
        }
    }

    /// Set the capacity of every intermediate queue (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Publish stage events to `events`
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline<T> {
        Pipeline {
            wiring: self.wiring,
            stage_names: self.stage_names,
            queue_capacity: self.queue_capacity,
            events: self.events,
        }
    }
}

fn finish(ctx: &StageContext, result: &Result<usize, StageError>) {
    match result {
        Ok(emitted) => ctx.completed(*emitted),
        Err(e) => tracing::warn!("Stage {} failed: {}", ctx.name(), e),
    }
}

/// A fully wired chain of stages, ready to run once.
pub struct Pipeline<T> {
    wiring: Wiring<T>,
    stage_names: Vec<&'static str>,
    queue_capacity: usize,
    events: EventSender,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Start a pipeline builder at `source`
    pub fn builder<S>(source: S) -> PipelineBuilder<T>
    where
        S: Source<Output = T>,
    {
        PipelineBuilder::from_source(source)
    }

    /// Stage names in pipeline order
    pub fn stage_names(&self) -> &[&'static str] {
        &self.stage_names
    }

    /// Capacity of every intermediate queue
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Run every stage concurrently and drain the last queue.
    ///
    /// Returns everything the last stage emitted, or the first stage
    /// failure. On failure no output is returned, even if the last stage
    /// managed to emit something.
    pub fn run(self) -> Result<Vec<T>, PipelineError> {
        tracing::info!(
            "Starting pipeline: {} (queue capacity {})",
            self.stage_names.join(" -> "),
            self.queue_capacity
        );

        let mut launched = Vec::with_capacity(self.stage_names.len());
        let tail = (self.wiring)(self.queue_capacity, &self.events, &mut launched);

        let outputs: Vec<T> = tail.iter().collect();

        let mut failures = Vec::new();
        for stage in launched {
            match stage.handle {
                Err(source) => failures.push(PipelineError::Spawn {
                    stage: stage.name,
                    source,
                }),
                Ok(handle) => match handle.join() {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => failures.push(PipelineError::Stage(e)),
                    Err(_) => failures.push(PipelineError::StagePanicked { stage: stage.name }),
                },
            }
        }

        match root_cause(failures) {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    }
}

/// Pick the failure to report: the first one in stage order that is not
/// merely a reaction to a downstream stage dying.
fn root_cause(failures: Vec<PipelineError>) -> Option<PipelineError> {
    let primary = failures.iter().position(|e| !e.is_secondary());
    let mut failures = failures;
    match primary {
        Some(index) => Some(failures.swap_remove(index)),
        None => failures.into_iter().next(),
    }
}
