//! # Core Module
//!
//! The signing engine, independent of any front end.
//!
//! ## Modules
//! - `digest` - Fast and slow string digests
//! - `quota` - Admission gate for the slow digest
//! - `pipeline` - Generic stage executor with bounded queues
//! - `stages` - SingleHash, MultiHash and CombineResults
//! - `signer` - Wires the stages into one run

pub mod digest;
pub mod pipeline;
pub mod quota;
pub mod signer;
pub mod stages;

// Re-export commonly used types
pub use digest::{Digest, DigestAlgorithmKind};
pub use pipeline::{Pipeline, Source, Stage};
pub use quota::Quota;
pub use signer::{Signer, SignerConfig, SignerResult};
