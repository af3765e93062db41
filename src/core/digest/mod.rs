//! # Digest Module
//!
//! The string digests the signing stages are built from.
//!
//! ## Supported Algorithms
//! - **CRC-32** - the default fast digest
//! - **MD5** - the default slow digest
//! - **XXH3** - an alternative fast digest
//!
//! Any type implementing [`Digest`] can be plugged into the stages, which
//! is how the tests substitute readable stand-ins such as `F(x)`.
//!
//! ## Example
//! ```rust,ignore
//! use hash_signer::core::digest::{DigestAlgorithmKind, DigestConfig};
//!
//! let slow = DigestConfig::new(DigestAlgorithmKind::Md5)
//!     .latency(Duration::from_millis(10))
//!     .build();
//!
//! let signature = slow.digest("0");
//! ```

mod algorithms;
mod throttled;
mod traits;

pub use algorithms::{Crc32Digest, Md5Digest, Xxh3Digest};
pub use throttled::Throttled;
pub use traits::{Digest, DigestAlgorithmKind};

use std::sync::Arc;
use std::time::Duration;

/// Configuration builder for digests
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Algorithm to use
    algorithm: DigestAlgorithmKind,
    /// Artificial delay added to every call
    latency: Duration,
}

impl DigestConfig {
    /// Create a configuration for `algorithm` with no added latency
    pub fn new(algorithm: DigestAlgorithmKind) -> Self {
        Self {
            algorithm,
            latency: Duration::ZERO,
        }
    }

    /// Add a fixed delay to every call.
    ///
    /// Simulates an expensive digest so the effect of the quota and the
    /// fan-out is visible in wall-clock time.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build the digest
    pub fn build(self) -> Arc<dyn Digest> {
        let base: Box<dyn Digest> = match self.algorithm {
            DigestAlgorithmKind::Crc32 => Box::new(Crc32Digest::new()),
            DigestAlgorithmKind::Md5 => Box::new(Md5Digest::new()),
            DigestAlgorithmKind::Xxh3 => Box::new(Xxh3Digest::new()),
        };

        if self.latency.is_zero() {
            Arc::from(base)
        } else {
            Arc::new(Throttled::new(base, self.latency))
        }
    }
}
