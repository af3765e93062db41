//! Stage abstraction and shared fan-out helper.

use crate::error::StageError;
use crate::events::{Event, EventSender, StageEvent, StageProgress};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

/// A pipeline step with an upstream queue.
///
/// `process` owns both queue ends. Returning drops `output`, which closes
/// the queue and is the only end-of-stream signal downstream sees.
pub trait Stage: Send + 'static {
    /// Item type read from upstream
    type Input: Send + 'static;
    /// Item type written downstream
    type Output: Send + 'static;

    /// Stable name used in logs, events and errors
    fn name(&self) -> &'static str;

    /// Consume `input` until it closes, writing results to `output`.
    ///
    /// Returns the number of items emitted.
    fn process(
        &self,
        input: Receiver<Self::Input>,
        output: Sender<Self::Output>,
        ctx: &StageContext,
    ) -> Result<usize, StageError>;
}

/// The first pipeline step; it has no upstream queue.
pub trait Source: Send + 'static {
    /// Item type written downstream
    type Output: Send + 'static;

    /// Stable name used in logs, events and errors
    fn name(&self) -> &'static str;

    /// Write every item to `output`.
    ///
    /// Returns the number of items emitted.
    fn emit(&self, output: Sender<Self::Output>, ctx: &StageContext) -> Result<usize, StageError>;
}

/// Per-stage handle for reporting progress.
pub struct StageContext {
    name: &'static str,
    events: EventSender,
}

impl StageContext {
    /// Create a context for the stage called `name`
    pub fn new(name: &'static str, events: EventSender) -> Self {
        Self { name, events }
    }

    /// Name of the stage this context belongs to
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Report that the stage is running
    pub fn started(&self) {
        tracing::debug!("Stage {} running", self.name);
        self.events.send(Event::Stage(StageEvent::Started { stage: self.name }));
    }

    /// Report that input has closed and `in_flight` workers remain
    pub fn draining(&self, in_flight: usize) {
        tracing::debug!("Stage {} draining, {} in flight", self.name, in_flight);
        self.events.send(Event::Stage(StageEvent::Draining {
            stage: self.name,
            in_flight,
        }));
    }

    /// Report that `completed` items have been emitted so far
    pub fn item_processed(&self, completed: usize) {
        self.events.send(Event::Stage(StageEvent::ItemProcessed(StageProgress {
            stage: self.name,
            completed,
        })));
    }

    /// Report that the stage returned and closed its output
    pub fn completed(&self, emitted: usize) {
        tracing::debug!("Stage {} closed after {} items", self.name, emitted);
        self.events.send(Event::Stage(StageEvent::Completed {
            stage: self.name,
            emitted,
        }));
    }

    /// Error for a failed write to the output queue
    pub fn downstream_closed(&self) -> StageError {
        StageError::DownstreamClosed { stage: self.name }
    }
}

/// Start a named scoped thread on behalf of `stage`.
///
/// Unlike `Scope::spawn`, a failure to create the OS thread comes back as
/// [`StageError::WorkerSpawn`] instead of a panic.
pub fn spawn_worker<'scope, 'env, F, T>(
    scope: &'scope Scope<'scope, 'env>,
    stage: &'static str,
    f: F,
) -> Result<ScopedJoinHandle<'scope, T>, StageError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(format!("{}-worker", stage))
        .spawn_scoped(scope, f)
        .map_err(|source| StageError::WorkerSpawn { stage, source })
}

/// Worker handles of one stage.
///
/// Finished workers are joined whenever a new one is added, so the set only
/// holds what is still running plus the last arrivals.
struct Workers<'scope> {
    stage: &'static str,
    handles: Vec<ScopedJoinHandle<'scope, Result<(), StageError>>>,
    first_error: Option<StageError>,
}

impl<'scope> Workers<'scope> {
    fn new(stage: &'static str) -> Self {
        Self {
            stage,
            handles: Vec::new(),
            first_error: None,
        }
    }

    fn push(&mut self, handle: ScopedJoinHandle<'scope, Result<(), StageError>>) {
        self.reap();
        self.handles.push(handle);
    }

    /// Join every worker that has already finished
    fn reap(&mut self) {
        let mut index = 0;
        while index < self.handles.len() {
            if self.handles[index].is_finished() {
                let handle = self.handles.swap_remove(index);
                self.join(handle);
            } else {
                index += 1;
            }
        }
    }

    fn join(&mut self, handle: ScopedJoinHandle<'scope, Result<(), StageError>>) {
        let outcome = handle
            .join()
            .unwrap_or(Err(StageError::WorkerPanicked { stage: self.stage }));
        if let Err(e) = outcome {
            self.fail(e);
        }
    }

    fn fail(&mut self, error: StageError) {
        tracing::warn!("Worker in stage {} failed: {}", self.stage, error);
        self.first_error.get_or_insert(error);
    }

    /// Workers still running
    fn in_flight(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Handles not yet joined
    #[cfg(test)]
    fn held(&self) -> usize {
        self.handles.len()
    }

    /// Join the rest and return the first failure, if any
    fn join_all(mut self) -> Option<StageError> {
        for handle in std::mem::take(&mut self.handles) {
            self.join(handle);
        }
        self.first_error
    }
}

/// Run `worker` on every item of `input`, one thread per item.
///
/// Items are picked up as they arrive; the call returns once `input` has
/// closed and every worker has finished. Each worker is expected to emit
/// exactly one item. The first worker error (or panic) is returned after
/// all workers have been joined. If a worker thread cannot be started the
/// stage stops reading and fails with [`StageError::WorkerSpawn`].
pub fn for_each_concurrent<I, F>(
    input: Receiver<I>,
    ctx: &StageContext,
    worker: F,
) -> Result<usize, StageError>
where
    I: Send,
    F: Fn(I) -> Result<(), StageError> + Sync,
{
    let completed = AtomicUsize::new(0);

    thread::scope(|scope| {
        let mut workers = Workers::new(ctx.name());

        for item in input.iter() {
            let worker = &worker;
            let completed = &completed;
            let spawned = spawn_worker(scope, ctx.name(), move || -> Result<(), StageError> {
                worker(item)?;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                ctx.item_processed(done);
                Ok(())
            });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    workers.fail(e);
                    break;
                }
            }
        }

        ctx.draining(workers.in_flight());

        match workers.join_all() {
            Some(e) => Err(e),
            None => Ok(completed.load(Ordering::SeqCst)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{null_sender, EventChannel};
    use crossbeam_channel::{bounded, unbounded};

    #[test]
    fn for_each_concurrent_runs_every_item() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for n in 0..20 {
            in_tx.send(n).unwrap();
        }
        drop(in_tx);

        let ctx = StageContext::new("double", null_sender());
        let emitted = for_each_concurrent(in_rx, &ctx, |n: u32| {
            out_tx.send(n * 2).map_err(|_| ctx.downstream_closed())
        })
        .unwrap();
        drop(out_tx);

        let mut results: Vec<u32> = out_rx.iter().collect();
        results.sort();
        assert_eq!(emitted, 20);
        assert_eq!(results, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn for_each_concurrent_reports_worker_panic() {
        let (in_tx, in_rx) = bounded(2);
        in_tx.send(1).unwrap();
        in_tx.send(2).unwrap();
        drop(in_tx);

        let ctx = StageContext::new("fragile", null_sender());
        let result = for_each_concurrent(in_rx, &ctx, |n: u32| {
            if n == 2 {
                panic!("bad item");
            }
            Ok(())
        });

        assert!(matches!(
            result,
            Err(StageError::WorkerPanicked { stage: "fragile" })
        ));
    }

    #[test]
    fn for_each_concurrent_emits_lifecycle_events() {
        let (in_tx, in_rx) = unbounded();
        in_tx.send(()).unwrap();
        drop(in_tx);

        let (events, receiver) = EventChannel::new();
        let ctx = StageContext::new("observed", events);
        for_each_concurrent(in_rx, &ctx, |_| Ok(())).unwrap();
        drop(ctx);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Stage(StageEvent::ItemProcessed(p)) if p.completed == 1
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Stage(StageEvent::Draining { .. }))));
    }

    #[test]
    fn finished_workers_are_joined_as_new_ones_arrive() {
        thread::scope(|scope| {
            let mut workers = Workers::new("steady");

            for _ in 0..50 {
                let handle = scope.spawn(|| Ok(()));
                while !handle.is_finished() {
                    thread::yield_now();
                }
                workers.push(handle);
                // Everything before the newest handle has been reaped
                assert_eq!(workers.held(), 1);
            }

            assert!(workers.join_all().is_none());
        });
    }

    #[test]
    fn reaped_worker_errors_are_kept() {
        thread::scope(|scope| {
            let mut workers = Workers::new("lossy");

            let failing = scope.spawn(|| Err(StageError::DownstreamClosed { stage: "lossy" }));
            while !failing.is_finished() {
                thread::yield_now();
            }
            workers.push(failing);
            workers.push(scope.spawn(|| Ok(())));
            workers.push(scope.spawn(|| Ok(())));

            assert!(matches!(
                workers.join_all(),
                Some(StageError::DownstreamClosed { stage: "lossy" })
            ));
        });
    }

    #[test]
    fn spawn_worker_names_the_thread_after_the_stage() {
        let name = thread::scope(|scope| {
            spawn_worker(scope, "namer", || {
                thread::current().name().map(str::to_string)
            })
            .unwrap()
            .join()
            .unwrap()
        });

        assert_eq!(name.as_deref(), Some("namer-worker"));
    }
}
