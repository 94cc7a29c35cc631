//! # Tonal AST
//!
//! Typed abstract syntax for the tonal synthesis DSL back-end.
//!
//! The front-end (parser and type inferencer) hands this crate an already
//! type-checked, already desugared [`Program`]. Everything downstream works on
//! these types:
//!
//! ```text
//! type-checked Program
//!     ↓
//! tonal-passes  (normalization fixed point + dependency linearization)
//!     ↓
//! tonal-vm      (lowering to instruction form + interpretation)
//! ```
//!
//! The [`mapper`] module provides the environment-and-state-threading
//! traversal every normalization pass is written against.

pub mod ast;
pub mod foundation;
pub mod mapper;

pub use ast::*;
pub use foundation::{Path, Span};
