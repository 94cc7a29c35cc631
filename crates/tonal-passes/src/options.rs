//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::passes::ReplacementTable;

/// Cap on fixed-point iterations of the normalization passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Options for [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Iterations before the driver gives up on reaching a fixed point
    pub max_iterations: usize,
    /// Backend-specific call overloads
    pub replacements: ReplacementTable,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            replacements: ReplacementTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options: PipelineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PipelineOptions::default());
        assert_eq!(options.max_iterations, 20);
        assert!(options.replacements.is_empty());
    }
}
