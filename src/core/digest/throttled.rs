//! Latency wrapper for digests.

use super::traits::Digest;
use std::thread;
use std::time::Duration;

/// Wraps a digest and sleeps for a fixed time before each call returns.
pub struct Throttled<D> {
    inner: D,
    latency: Duration,
}

impl<D: Digest> Throttled<D> {
    /// Wrap `inner`, delaying every call by `latency`
    pub fn new(inner: D, latency: Duration) -> Self {
        Self { inner, latency }
    }

    /// The delay added to each call
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl<D: Digest> Digest for Throttled<D> {
    fn digest(&self, input: &str) -> String {
        let out = self.inner.digest(input);
        thread::sleep(self.latency);
        out
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
