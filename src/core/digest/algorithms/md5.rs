//! MD5 digest, printed as lowercase hex.

use super::super::traits::Digest;

/// MD5 digest
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Digest;

impl Md5Digest {
    /// Create a new MD5 digest
    pub fn new() -> Self {
        Self
    }
}

impl Digest for Md5Digest {
    fn digest(&self, input: &str) -> String {
        format!("{:x}", md5::compute(input.as_bytes()))
    }

    fn name(&self) -> &'static str {
        "md5"
    }
}
