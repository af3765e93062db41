//! SingleHash stage.
//!
//! For a value `n` with decimal form `s`:
//!
//! ```text
//! fast(s) + "~" + fast(slow(s))
//! ```
//!
//! `slow(s)` runs under the shared quota; the two `fast` calls then run in
//! parallel, `fast(slow(s))` on its own scoped thread.

use crate::core::digest::Digest;
use crate::core::pipeline::{for_each_concurrent, spawn_worker, Stage, StageContext};
use crate::core::quota::Quota;
use crate::error::StageError;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// First hashing stage: one worker per incoming value
pub struct SingleHash {
    fast: Arc<dyn Digest>,
    slow: Arc<dyn Digest>,
    quota: Arc<Quota>,
}

impl SingleHash {
    /// Stage name
    pub const NAME: &'static str = "single_hash";

    /// Create the stage. `quota` must be shared with every other caller of
    /// `slow` in the same run.
    pub fn new(fast: Arc<dyn Digest>, slow: Arc<dyn Digest>, quota: Arc<Quota>) -> Self {
        Self { fast, slow, quota }
    }

    /// Sign a single value
    pub fn sign(&self, value: i64) -> Result<String, StageError> {
        let data = value.to_string();
        tracing::debug!("Calculating SingleHash for {}", data);

        let slow = {
            let _permit = self.quota.acquire();
            self.slow.digest(&data)
        };

        thread::scope(|scope| {
            let chained = spawn_worker(scope, Self::NAME, || self.fast.digest(&slow))?;
            let plain = self.fast.digest(&data);
            let chained = chained
                .join()
                .map_err(|_| StageError::WorkerPanicked { stage: Self::NAME })?;

            Ok(format!("{}~{}", plain, chained))
        })
    }
}

impl Stage for SingleHash {
    type Input = i64;
    type Output = String;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &self,
        input: Receiver<i64>,
        output: Sender<String>,
        ctx: &StageContext,
    ) -> Result<usize, StageError> {
        for_each_concurrent(input, ctx, |value| {
            let signed = self.sign(value)?;
            output.send(signed).map_err(|_| ctx.downstream_closed())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    struct Tagged(&'static str);

    impl Digest for Tagged {
        fn digest(&self, input: &str) -> String {
            format!("{}({})", self.0, input)
        }
    }

    /// Records when each call starts and ends.
    struct Recording {
        calls: Mutex<Vec<(Instant, Instant)>>,
    }

    impl Digest for Recording {
        fn digest(&self, input: &str) -> String {
            let start = Instant::now();
            thread::sleep(Duration::from_millis(2));
            let end = Instant::now();
            self.calls.lock().unwrap().push((start, end));
            format!("S({})", input)
        }
    }

    /// Sleeps on every call and tracks how many calls overlap.
    struct Gauge {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Digest for Gauge {
        fn digest(&self, input: &str) -> String {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            self.active.fetch_sub(1, Ordering::SeqCst);
            format!("F({})", input)
        }
    }

    fn stand_in_stage() -> SingleHash {
        SingleHash::new(
            Arc::new(Tagged("F")),
            Arc::new(Tagged("S")),
            Arc::new(Quota::exclusive()),
        )
    }

    #[test]
    fn sign_composes_fast_and_slow() {
        assert_eq!(stand_in_stage().sign(5).unwrap(), "F(5)~F(S(5))");
    }

    #[test]
    fn sign_uses_decimal_form() {
        assert_eq!(stand_in_stage().sign(-12).unwrap(), "F(-12)~F(S(-12))");
    }

    #[test]
    fn process_emits_one_result_per_value() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for n in [1, 2, 3] {
            in_tx.send(n).unwrap();
        }
        drop(in_tx);

        let ctx = StageContext::new(SingleHash::NAME, null_sender());
        let emitted = stand_in_stage().process(in_rx, out_tx, &ctx).unwrap();

        let mut results: Vec<String> = out_rx.iter().collect();
        results.sort();
        assert_eq!(emitted, 3);
        assert_eq!(
            results,
            vec!["F(1)~F(S(1))", "F(2)~F(S(2))", "F(3)~F(S(3))"]
        );
    }

    #[test]
    fn slow_digest_calls_never_overlap() {
        let recording = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
        });
        let quota = Arc::new(Quota::exclusive());
        let stage = SingleHash::new(Arc::new(Tagged("F")), recording.clone(), quota.clone());

        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for n in 0..16 {
            in_tx.send(n).unwrap();
        }
        drop(in_tx);

        let ctx = StageContext::new(SingleHash::NAME, null_sender());
        stage.process(in_rx, out_tx, &ctx).unwrap();
        assert_eq!(out_rx.iter().count(), 16);

        let mut calls = recording.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls.len(), 16);
        for pair in calls.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "slow digest calls overlapped");
        }
        assert_eq!(quota.peak(), 1);
    }

    #[test]
    fn fast_branches_run_side_by_side() {
        let gauge = Arc::new(Gauge {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let stage = SingleHash::new(
            gauge.clone(),
            Arc::new(Tagged("S")),
            Arc::new(Quota::exclusive()),
        );

        assert_eq!(stage.sign(3).unwrap(), "F(3)~F(S(3))");
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
    }
}
