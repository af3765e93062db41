//! CRC-32 digest.
//!
//! The checksum is printed in decimal, not hex, so `"0"` digests to
//! `"4108050209"`.

use super::super::traits::Digest;

/// IEEE CRC-32 digest
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Digest;

impl Crc32Digest {
    /// Create a new CRC-32 digest
    pub fn new() -> Self {
        Self
    }
}

impl Digest for Crc32Digest {
    fn digest(&self, input: &str) -> String {
        crc32fast::hash(input.as_bytes()).to_string()
    }

    fn name(&self) -> &'static str {
        "crc32"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_decimal_checksum() {
        assert_eq!(Crc32Digest::new().digest("0"), "4108050209");
    }

    #[test]
    fn digest_is_deterministic() {
        let digest = Crc32Digest::new();
        assert_eq!(digest.digest("hello"), digest.digest("hello"));
        assert_ne!(digest.digest("hello"), digest.digest("hellO"));
    }
}
