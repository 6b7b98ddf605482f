//! Run context: where a run currently is in time.

use serde::{Deserialize, Serialize};
use talus_types::Scalar;

/// Mutable bookkeeping of a run, passed explicitly to boundaries, hooks
/// and output sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    /// Run name, used as the stem of output files.
    pub name: String,
    /// Simulation time (seconds).
    pub time: Scalar,
    /// Completed timesteps.
    pub step: u64,
    /// Index of the next output frame.
    pub save_index: u64,
}

impl RunContext {
    /// Context at the start of a run.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: 0.0,
            step: 0,
            save_index: 0,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("talus")
    }
}
