//! CombineResults stage.
//!
//! Collects every upstream result, sorts them and joins them with `_`.
//! This is where the nondeterministic arrival order of the fan-out stages
//! turns into a single deterministic string.

use crate::core::pipeline::{Stage, StageContext};
use crate::error::StageError;
use crossbeam_channel::{Receiver, Sender};

/// Separator placed between sorted results
pub const COMBINE_SEPARATOR: &str = "_";

/// Final stage: emits exactly one combined string
#[derive(Debug, Default, Clone, Copy)]
pub struct CombineResults;

impl CombineResults {
    /// Stage name
    pub const NAME: &'static str = "combine_results";

    /// Create the stage
    pub fn new() -> Self {
        Self
    }
}

/// Sort `results` lexicographically and join them with `_`
pub fn combine(mut results: Vec<String>) -> String {
    results.sort();
    results.join(COMBINE_SEPARATOR)
}

impl Stage for CombineResults {
    type Input = String;
    type Output = String;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &self,
        input: Receiver<String>,
        output: Sender<String>,
        ctx: &StageContext,
    ) -> Result<usize, StageError> {
        let mut results = Vec::new();
        for data in input.iter() {
            tracing::trace!("CombineResults got {}", data);
            results.push(data);
        }
        ctx.draining(0);

        let count = results.len();
        let combined = combine(results);
        tracing::debug!("Combined {} results", count);

        output.send(combined).map_err(|_| ctx.downstream_closed())?;
        ctx.item_processed(1);
        Ok(1)
    }
}
