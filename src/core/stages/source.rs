//! Source stage feeding the raw values.

use crate::core::pipeline::{Source, StageContext};
use crate::error::StageError;
use crossbeam_channel::Sender;

/// Emits a fixed list of integers, in order
#[derive(Debug, Clone)]
pub struct ValuesSource {
    values: Vec<i64>,
}

impl ValuesSource {
    /// Stage name
    pub const NAME: &'static str = "source";

    /// Create a source for `values`
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }
}

impl Source for ValuesSource {
    type Output = i64;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn emit(&self, output: Sender<i64>, ctx: &StageContext) -> Result<usize, StageError> {
        for (index, value) in self.values.iter().enumerate() {
            output.send(*value).map_err(|_| ctx.downstream_closed())?;
            ctx.item_processed(index + 1);
        }
        Ok(self.values.len())
    }
}
