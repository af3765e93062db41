//! # Stages Module
//!
//! The concrete signing stages, in pipeline order:
//! 1. **Source** - emits the input integers
//! 2. **SingleHash** - `fast(s) ~ fast(slow(s))`, slow calls under the quota
//! 3. **MultiHash** - six ranked `fast(th + s)` digests, concatenated
//! 4. **CombineResults** - sort everything and join with `_`

mod combine;
mod multi_hash;
mod single_hash;
mod source;

pub use combine::{combine, CombineResults, COMBINE_SEPARATOR};
pub use multi_hash::{concat_ranked, MultiHash, RankedDigest, MULTI_HASH_FANOUT};
pub use single_hash::SingleHash;
pub use source::ValuesSource;
