//! # Hash Signer
//!
//! A concurrent hashing pipeline with bounded fan-out and fan-in.
//!
//! ## How It Works
//! - **Bounded queues** - every stage reads and writes through a small
//!   queue, so a fast stage waits for a slow one instead of piling up work
//! - **Fan-out per item** - each value is hashed on its own worker, with
//!   further parallel sub-tasks inside
//! - **Quota on the slow digest** - at most one slow digest call runs at a
//!   time across the whole run
//! - **Deterministic output** - ranked fan-in and a final sort make the
//!   result independent of scheduling
//!
//! ## Architecture
//! - `core` - The pipeline engine and signing stages
//! - `events` - Progress reporting over channels
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, SignerError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `default_filter`
/// applies when `RUST_LOG` is not set.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("A global tracing subscriber was already installed");
    }
}
