//! MultiHash stage.
//!
//! For an input `s`, computes `fast(th + s)` for `th` in `0..6`, each on its
//! own scoped thread, and concatenates the six digests in `th` order. The
//! sub-tasks finish in any order; each result carries its rank and the
//! worker sorts on it before joining, which keeps the output deterministic.

use crate::core::digest::Digest;
use crate::core::pipeline::{for_each_concurrent, spawn_worker, Stage, StageContext};
use crate::error::StageError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Number of ranked digests per input
pub const MULTI_HASH_FANOUT: usize = 6;

/// One sub-task result: the rank it was computed for and its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedDigest {
    pub rank: usize,
    pub digest: String,
}

/// Second hashing stage: one worker per input, six sub-tasks per worker
pub struct MultiHash {
    fast: Arc<dyn Digest>,
}

impl MultiHash {
    /// Stage name
    pub const NAME: &'static str = "multi_hash";

    /// Create the stage
    pub fn new(fast: Arc<dyn Digest>) -> Self {
        Self { fast }
    }

    /// Expand one input into its concatenated ranked digests
    pub fn expand(&self, data: &str) -> Result<String, StageError> {
        tracing::debug!("Calculating MultiHash for {}", data);

        let (tx, rx) = unbounded::<RankedDigest>();
        thread::scope(|scope| {
            let mut branches = Vec::with_capacity(MULTI_HASH_FANOUT);
            for rank in 0..MULTI_HASH_FANOUT {
                let tx = tx.clone();
                let fast = &self.fast;
                branches.push(spawn_worker(scope, Self::NAME, move || {
                    let digest = fast.digest(&format!("{}{}", rank, data));
                    let _ = tx.send(RankedDigest { rank, digest });
                })?);
            }

            let panicked = branches
                .into_iter()
                .map(|branch| branch.join())
                .filter(|joined| joined.is_err())
                .count();
            if panicked > 0 {
                return Err(StageError::WorkerPanicked { stage: Self::NAME });
            }
            Ok(())
        })?;
        drop(tx);

        let entries: Vec<RankedDigest> = rx.iter().take(MULTI_HASH_FANOUT).collect();
        concat_ranked(entries)
    }
}

/// Join exactly [`MULTI_HASH_FANOUT`] entries in ascending rank order.
///
/// The sort is stable and keyed on rank alone, so entries sharing a rank
/// keep their arrival order.
pub fn concat_ranked(mut entries: Vec<RankedDigest>) -> Result<String, StageError> {
    if entries.len() != MULTI_HASH_FANOUT {
        return Err(StageError::IncompleteFanIn {
            stage: MultiHash::NAME,
            expected: MULTI_HASH_FANOUT,
            received: entries.len(),
        });
    }

    entries.sort_by_key(|entry| entry.rank);
    Ok(entries.into_iter().map(|entry| entry.digest).collect())
}

impl Stage for MultiHash {
    type Input = String;
    type Output = String;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &self,
        input: Receiver<String>,
        output: Sender<String>,
        ctx: &StageContext,
    ) -> Result<usize, StageError> {
        for_each_concurrent(input, ctx, |data| {
            let expanded = self.expand(&data)?;
            output.send(expanded).map_err(|_| ctx.downstream_closed())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};
    use uuid::Uuid;

    struct Tagged;

    impl Digest for Tagged {
        fn digest(&self, input: &str) -> String {
            format!("F({})", input)
        }
    }

    /// Sleeps a random 0-3ms before answering, shuffling completion order.
    struct Jittered;

    impl Digest for Jittered {
        fn digest(&self, input: &str) -> String {
            let jitter = Uuid::new_v4().as_bytes()[0] % 4;
            thread::sleep(Duration::from_millis(jitter as u64));
            format!("F({})", input)
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
            thread::sleep(Duration::from_millis(100));
            self.active.fetch_sub(1, Ordering::SeqCst);
            format!("F({})", input)
        }
    }

    /// Panics for one rank only.
    struct FailsOnRank(usize);

    impl Digest for FailsOnRank {
        fn digest(&self, input: &str) -> String {
            if input.starts_with(&self.0.to_string()) {
                panic!("digest failed");
            }
            format!("F({})", input)
        }
    }

    fn entry(rank: usize, digest: &str) -> RankedDigest {
        RankedDigest {
            rank,
            digest: digest.to_string(),
        }
    }

    #[test]
    fn expand_concatenates_in_rank_order() {
        let stage = MultiHash::new(Arc::new(Tagged));
        assert_eq!(
            stage.expand("X").unwrap(),
            "F(0X)F(1X)F(2X)F(3X)F(4X)F(5X)"
        );
    }

    #[test]
    fn expand_is_deterministic_under_jitter() {
        let stage = MultiHash::new(Arc::new(Jittered));
        let expected = "F(0X)F(1X)F(2X)F(3X)F(4X)F(5X)";

        for _ in 0..25 {
            assert_eq!(stage.expand("X").unwrap(), expected);
        }
    }

    #[test]
    fn concat_sorts_out_of_order_entries() {
        let entries = vec![
            entry(3, "d"),
            entry(0, "a"),
            entry(5, "f"),
            entry(1, "b"),
            entry(4, "e"),
            entry(2, "c"),
        ];
        assert_eq!(concat_ranked(entries).unwrap(), "abcdef");
    }

    #[test]
    fn concat_keeps_arrival_order_for_equal_ranks() {
        let entries = vec![
            entry(1, "y"),
            entry(0, "a"),
            entry(1, "z"),
            entry(0, "b"),
            entry(2, "c"),
            entry(2, "d"),
        ];
        assert_eq!(concat_ranked(entries).unwrap(), "abyzcd");
    }

    #[test]
    fn concat_rejects_partial_fan_in() {
        let entries = vec![entry(0, "a"), entry(1, "b")];

        match concat_ranked(entries) {
            Err(StageError::IncompleteFanIn {
                expected, received, ..
            }) => {
                assert_eq!(expected, 6);
                assert_eq!(received, 2);
            }
            other => panic!("expected IncompleteFanIn, got {:?}", other),
        }
    }

    #[test]
    fn process_expands_every_input() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        in_tx.send("A".to_string()).unwrap();
        in_tx.send("B".to_string()).unwrap();
        drop(in_tx);

        let ctx = StageContext::new(MultiHash::NAME, null_sender());
        let emitted = MultiHash::new(Arc::new(Tagged))
            .process(in_rx, out_tx, &ctx)
            .unwrap();

        let mut results: Vec<String> = out_rx.iter().collect();
        results.sort();
        assert_eq!(emitted, 2);
        assert_eq!(
            results,
            vec![
                "F(0A)F(1A)F(2A)F(3A)F(4A)F(5A)",
                "F(0B)F(1B)F(2B)F(3B)F(4B)F(5B)"
            ]
        );
    }

    #[test]
    fn expand_runs_all_six_digests_at_once() {
        let gauge = Arc::new(Gauge {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let stage = MultiHash::new(gauge.clone());

        let start = Instant::now();
        let expanded = stage.expand("X").unwrap();
        let elapsed = start.elapsed();

        assert_eq!(expanded, "F(0X)F(1X)F(2X)F(3X)F(4X)F(5X)");
        assert!(gauge.peak.load(Ordering::SeqCst) >= MULTI_HASH_FANOUT);
        // One after another would take 600ms
        assert!(elapsed < Duration::from_millis(400), "took {:?}", elapsed);
    }

    #[test]
    fn panicking_digest_fails_the_expansion() {
        let stage = MultiHash::new(Arc::new(FailsOnRank(3)));

        assert!(matches!(
            stage.expand("X"),
            Err(StageError::WorkerPanicked { stage: "multi_hash" })
        ));
    }
}
