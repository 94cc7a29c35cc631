//! # Tonal
//!
//! Back-end of the tonal synthesis DSL.
//!
//! This crate is a facade that re-exports functionality from:
//! - `tonal-ast` - typed AST, type table and the rewrite framework
//! - `tonal-passes` - normalization passes, dependency graph, linearization
//! - `tonal-vm` - lowering and the reference interpreter
//!
//! ## Architecture
//!
//! ```text
//! tonal-ast      - Program, Type, Expr, Stmt, Mapper
//!     ↓
//! tonal-passes   - fixed-point normalization, pull-in ordering
//!     ↓
//! tonal-vm       - FunctionTable, MachineState, Value
//!     ↓
//! tonal (facade) - CompileOptions + compile / interpret API
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tonal::{interpret, CompileOptions, Path, Value};
//!
//! let value = interpret(program, &Path::from("f"), vec![Value::Int(5)], &CompileOptions::default())?;
//! ```

pub use tonal_ast::{self as ast, *};
pub use tonal_passes::{self as passes, normalize, NormalizeReport, PipelineOptions};
pub use tonal_vm::{self as vm, FunctionTable, LowerError, MachineConfig, Value, VmError};

pub mod compile;
pub mod config;
pub mod error;

pub use compile::{
    compile, eval_expression, eval_expression_with, interpret, Compiled, EVAL_ENTRY,
};
pub use config::CompileOptions;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
