//! # hash-signer CLI
//!
//! Command-line interface for the hash signer.
//!
//! ## Usage
//! ```bash
//! hash-signer sign 0 1
//! hash-signer sign --from-file values.txt --output json
//! ```

mod cli;

use hash_signer::Result;

fn main() -> Result<()> {
    cli::run()
}
