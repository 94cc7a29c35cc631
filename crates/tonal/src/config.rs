//! Compile options.
//!
//! Everything has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```json
//! {
//!   "pipeline": {
//!     "max_iterations": 20,
//!     "replacements": [
//!       { "name": "clip", "args": ["real"], "ret": "real", "target": "dsp.clip_f" }
//!     ]
//!   },
//!   "machine": { "max_call_depth": 256 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use tonal_passes::PipelineOptions;
use tonal_vm::MachineConfig;

/// Options for [`crate::compile`] and the interpretation entry points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub pipeline: PipelineOptions,
    pub machine: MachineConfig,
}

impl CompileOptions {
    /// Parses options from JSON, filling anything missing with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
