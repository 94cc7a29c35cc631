//! # Tonal VM
//!
//! Reference interpreter for normalized tonal programs.
//!
//! ```text
//! normalized Program ─ compiler ─► FunctionTable ─ eval ─► Value
//! ```
//!
//! The interpreter exists to evaluate expressions at compile time and to
//! serve as an executable reference for the emitting backends. It runs a
//! program only after normalization: tuple-returning calls and statement
//! level conditionals must already be gone.

pub mod code;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod machine;
pub mod value;

pub use code::{Function, FunctionEntry, FunctionTable, Instr, Lvalue};
pub use compiler::{lower_function, lower_program, zero_value};
pub use error::{LowerError, VmError};
pub use eval::{eval_expr, eval_stmts, run, Flow};
pub use machine::{Machine, MachineConfig, MachineState, DEFAULT_MAX_CALL_DEPTH};
pub use value::{Object, Value};
