//! # Quota Module
//!
//! A counting admission gate for scarce work.
//!
//! The signer creates one [`Quota`] per pipeline and hands it to every stage
//! that calls the slow digest, so at most `capacity` such calls run at once
//! across all workers. Permits are RAII guards and are returned on drop,
//! including when the holder unwinds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Counting semaphore with holder statistics
#[derive(Debug)]
pub struct Quota {
    capacity: usize,
    held: Mutex<usize>,
    released: Condvar,
    peak: AtomicUsize,
    grants: AtomicUsize,
}

impl Quota {
    /// Create a quota admitting `capacity` concurrent holders.
    ///
    /// A capacity of zero would block every caller forever; it is clamped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            held: Mutex::new(0),
            released: Condvar::new(),
            peak: AtomicUsize::new(0),
            grants: AtomicUsize::new(0),
        }
    }

    /// Quota admitting a single holder
    pub fn exclusive() -> Self {
        Self::new(1)
    }

    /// Block until a permit is free, then take it.
    pub fn acquire(&self) -> QuotaPermit<'_> {
        let start = Instant::now();
        let mut held = self.lock();
        while *held >= self.capacity {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *held += 1;
        let holders = *held;
        drop(held);

        self.peak.fetch_max(holders, Ordering::SeqCst);
        self.grants.fetch_add(1, Ordering::SeqCst);

        let waited = start.elapsed();
        if waited > Duration::from_millis(1) {
            tracing::trace!("Quota granted after waiting {:?}", waited);
        }

        QuotaPermit { quota: self }
    }

    /// Take a permit only if one is free right now
    pub fn try_acquire(&self) -> Option<QuotaPermit<'_>> {
        let mut held = self.lock();
        if *held >= self.capacity {
            return None;
        }
        *held += 1;
        let holders = *held;
        drop(held);

        self.peak.fetch_max(holders, Ordering::SeqCst);
        self.grants.fetch_add(1, Ordering::SeqCst);
        Some(QuotaPermit { quota: self })
    }

    /// Maximum number of concurrent holders
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_use(&self) -> usize {
        *self.lock()
    }

    /// Highest number of simultaneous holders seen so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total permits granted so far
    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    fn release(&self) {
        let mut held = self.lock();
        *held = held.saturating_sub(1);
        drop(held);
        self.released.notify_one();
    }

    // The counter stays consistent even if a holder panicked while the
    // lock was taken, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::exclusive()
    }
}

/// A held permit; dropping it returns the permit to the quota
#[must_use = "the permit is released as soon as it is dropped"]
#[derive(Debug)]
pub struct QuotaPermit<'a> {
    quota: &'a Quota,
}

impl Drop for QuotaPermit<'_> {
    fn drop(&mut self) {
        self.quota.release();
    }
}
