//! Facade error type.

use thiserror::Error;

use tonal_vm::{LowerError, VmError};

/// Errors from the compile and interpret entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// The normalized program still contains a form the VM cannot run.
    #[error("lowering failed: {0}")]
    Lower(#[from] LowerError),

    /// The interpreter hit an invariant violation.
    #[error("evaluation failed: {0}")]
    Vm(#[from] VmError),

    /// Options could not be parsed.
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
