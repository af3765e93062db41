//! XXH3 digest.
//!
//! Much faster than CRC-32 on long inputs; useful as the fast digest when
//! the exact output of the classic CRC-32/MD5 pairing doesn't matter.

use super::super::traits::Digest;
use xxhash_rust::xxh3::xxh3_64;

/// XXH3 64-bit digest
#[derive(Debug, Default, Clone, Copy)]
pub struct Xxh3Digest;

impl Xxh3Digest {
    /// Create a new XXH3 digest
    pub fn new() -> Self {
        Self
    }
}

impl Digest for Xxh3Digest {
    fn digest(&self, input: &str) -> String {
        format!("{:016x}", xxh3_64(input.as_bytes()))
    }

    fn name(&self) -> &'static str {
        "xxh3"
    }
}
