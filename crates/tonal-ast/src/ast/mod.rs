//! Typed AST for the tonal back-end.
//!
//! The front-end produces these nodes fully typed; the back-end trusts every
//! `ty` field and never re-checks it.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod table;
pub mod types;
pub mod walk;

pub use decl::{Decl, DeclKind, ExternDecl, FunctionDecl, Member, Param, Program, TypeDecl};
pub use expr::{BinaryOp, Expr, ExprKind, Lhs, LhsKind, UnaryOp};
pub use stmt::Stmt;
pub use table::{Signature, TypeTable};
pub use types::Type;
pub use walk::{walk_expr, walk_lhs, walk_stmts};
