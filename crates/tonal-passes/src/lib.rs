//! # Tonal Passes
//!
//! Normalization of a type-checked tonal [`Program`](tonal_ast::Program)
//! into the form the VM and the text backends consume:
//!
//! - no tuples (multi-value returns go through a context argument)
//! - no conditional expressions in value position
//! - builtins folded, calls retargeted to backend overloads
//! - top-level declarations ordered types, externals, functions, each
//!   after what it depends on
//!
//! [`normalize`] is the entry point. The passes are also usable one by one
//! through [`tonal_ast::mapper::Mapper`] with a [`PassState`].

pub mod graph;
pub mod linearize;
pub mod options;
pub mod passes;
pub mod pipeline;

pub use graph::Graph;
pub use options::{PipelineOptions, DEFAULT_MAX_ITERATIONS};
pub use passes::{Dependencies, PassState, Replacement, ReplacementTable};
pub use pipeline::{normalize, NormalizeReport};
