//! Trait definitions for string digests.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A deterministic string-to-string digest.
///
/// Implementations must be pure: the same input always yields the same
/// output, whichever thread calls it.
pub trait Digest: Send + Sync {
    /// Compute the digest of `input`
    fn digest(&self, input: &str) -> String;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<D: Digest + ?Sized> Digest for Arc<D> {
    fn digest(&self, input: &str) -> String {
        (**self).digest(input)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<D: Digest + ?Sized> Digest for Box<D> {
    fn digest(&self, input: &str) -> String {
        (**self).digest(input)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Available digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithmKind {
    /// IEEE CRC-32, rendered as a decimal integer
    Crc32,
    /// MD5, rendered as lowercase hex
    Md5,
    /// XXH3 64-bit, rendered as 16 hex digits
    Xxh3,
}

impl DigestAlgorithmKind {
    /// All supported algorithms
    pub const ALL: [DigestAlgorithmKind; 3] = [
        DigestAlgorithmKind::Crc32,
        DigestAlgorithmKind::Md5,
        DigestAlgorithmKind::Xxh3,
    ];

    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            DigestAlgorithmKind::Crc32 => "CRC-32 (IEEE) - checksum, printed as a decimal number",
            DigestAlgorithmKind::Md5 => "MD5 - cryptographic digest, printed as 32 hex digits",
            DigestAlgorithmKind::Xxh3 => "XXH3 - non-cryptographic 64-bit hash, printed as 16 hex digits",
        }
    }
}

impl std::fmt::Display for DigestAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithmKind::Crc32 => write!(f, "crc32"),
            DigestAlgorithmKind::Md5 => write!(f, "md5"),
            DigestAlgorithmKind::Xxh3 => write!(f, "xxh3"),
        }
    }
}
