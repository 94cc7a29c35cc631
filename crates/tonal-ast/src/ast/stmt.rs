//! Statements.
//!
//! Blocks are plain `Vec<Stmt>`: control reaching the end of a block falls
//! through to the statement after the enclosing one.

use serde::{Deserialize, Serialize};

use super::expr::{Expr, Lhs};
use crate::foundation::Span;

/// A statement in a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Variable declaration: `val x = expr` or `val x : int`
    ///
    /// The target may be a tuple pattern until tuple elimination splits it.
    Decl {
        lhs: Lhs,
        rhs: Option<Expr>,
        span: Span,
    },

    /// Assignment: `lhs = expr`
    Bind { lhs: Lhs, rhs: Expr, span: Span },

    /// `return expr`
    Return { value: Expr, span: Span },

    /// Conditional statement
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        span: Span,
    },

    /// `while cond { body }`
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn decl(lhs: Lhs, rhs: Option<Expr>) -> Self {
        let span = lhs.span;
        Stmt::Decl { lhs, rhs, span }
    }

    pub fn bind(lhs: Lhs, rhs: Expr) -> Self {
        let span = lhs.span;
        Stmt::Bind { lhs, rhs, span }
    }

    pub fn ret(value: Expr) -> Self {
        let span = value.span;
        Stmt::Return { value, span }
    }

    pub fn if_(cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Self {
        let span = cond.span;
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            span,
        }
    }

    pub fn while_(cond: Expr, body: Vec<Stmt>) -> Self {
        let span = cond.span;
        Stmt::While { cond, body, span }
    }

    /// Source location of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl { span, .. }
            | Stmt::Bind { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. } => *span,
        }
    }

    /// Replace the span.
    pub fn with_span(mut self, new_span: Span) -> Self {
        match &mut self {
            Stmt::Decl { span, .. }
            | Stmt::Bind { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. } => *span = new_span,
        }
        self
    }
}
