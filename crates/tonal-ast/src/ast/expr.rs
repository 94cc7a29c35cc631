//! Typed expressions and assignment targets.
//!
//! Every [`Expr`] carries the type the front-end inferred for it and its
//! source span. Constructors derive the obvious result type (comparisons are
//! `bool`, a tuple literal has the tuple of its component types, ...); where
//! the type cannot be derived locally (calls, member access) it is passed in.

use serde::{Deserialize, Serialize};

use super::types::Type;
use crate::foundation::{Path, Span};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    /// Logical and
    And,
    /// Logical or
    Or,
    BitOr,
    BitAnd,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// Operator symbol as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitOr => "|",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    /// Comparison operators produce `bool`.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    /// Logical connectives take and produce `bool`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
    /// Logical not
    Not,
}

/// A typed expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// The expression variant
    pub kind: ExprKind,
    /// Inferred type
    pub ty: Type,
    /// Source location
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// The unit value `()`
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
    /// Reference to a local variable or parameter
    Id(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Conditional expression producing a value
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Array literal
    Array(Vec<Expr>),
    /// Tuple literal
    Tuple(Vec<Expr>),
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// Struct member access
    Member {
        object: Box<Expr>,
        member: String,
    },
    /// Function call
    Call {
        path: Path,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Create an expression with a default span.
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self {
            kind,
            ty,
            span: Span::default(),
        }
    }

    /// Replace the span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn unit() -> Self {
        Self::new(ExprKind::Unit, Type::Void)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Bool(value), Type::Bool)
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Int(value), Type::Int)
    }

    pub fn real(value: f64) -> Self {
        Self::new(ExprKind::Real(value), Type::Real)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::String(value.into()), Type::String)
    }

    pub fn id(name: impl Into<String>, ty: Type) -> Self {
        Self::new(ExprKind::Id(name.into()), ty)
    }

    /// Unary application; `not` is `bool`, negation keeps the operand type.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let ty = match op {
            UnaryOp::Not => Type::Bool,
            UnaryOp::Neg => operand.ty.clone(),
        };
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
        .with_span_of_children()
    }

    /// Binary application; comparisons and connectives are `bool`, everything
    /// else has the type of the left operand.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let ty = if op.is_relational() || op.is_logical() {
            Type::Bool
        } else {
            left.ty.clone()
        };
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
        .with_span_of_children()
    }

    /// Conditional expression typed by its `then` branch.
    pub fn if_(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        let ty = then_branch.ty.clone();
        Self::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            ty,
        )
        .with_span_of_children()
    }

    pub fn tuple(elems: Vec<Expr>) -> Self {
        let ty = Type::Tuple(elems.iter().map(|e| e.ty.clone()).collect());
        Self::new(ExprKind::Tuple(elems), ty)
    }

    pub fn array(elem: Type, elems: Vec<Expr>) -> Self {
        let ty = Type::array(elem, elems.len());
        Self::new(ExprKind::Array(elems), ty)
    }

    /// Array indexing typed by the element type of `object`.
    pub fn index(object: Expr, index: Expr) -> Self {
        let ty = object.ty.array_elem().cloned().unwrap_or(Type::Void);
        Self::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            ty,
        )
    }

    pub fn member(object: Expr, member: impl Into<String>, ty: Type) -> Self {
        Self::new(
            ExprKind::Member {
                object: Box::new(object),
                member: member.into(),
            },
            ty,
        )
    }

    pub fn call(path: impl Into<Path>, args: Vec<Expr>, ty: Type) -> Self {
        Self::new(
            ExprKind::Call {
                path: path.into(),
                args,
            },
            ty,
        )
    }

    /// Check if this is a conditional expression.
    pub fn is_if(&self) -> bool {
        matches!(self.kind, ExprKind::If { .. })
    }

    /// Check if this is a call.
    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }

    /// Names of every variable this expression reads.
    pub fn referenced_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        super::walk::walk_expr(self, &mut |node| {
            if let ExprKind::Id(name) = &node.kind {
                if !ids.contains(name) {
                    ids.push(name.clone());
                }
            }
        });
        ids
    }

    fn with_span_of_children(mut self) -> Self {
        let span = match &self.kind {
            ExprKind::Unary { operand, .. } => operand.span,
            ExprKind::Binary { left, right, .. } if left.span.file_id == right.span.file_id => {
                left.span.merge(&right.span)
            }
            ExprKind::If {
                cond, else_branch, ..
            } if cond.span.file_id == else_branch.span.file_id => cond.span.merge(&else_branch.span),
            _ => self.span,
        };
        self.span = span;
        self
    }
}

/// An assignment or declaration target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lhs {
    /// The target variant
    pub kind: LhsKind,
    /// Type of the stored value
    pub ty: Type,
    /// Source location
    pub span: Span,
}

/// Assignment target variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LhsKind {
    /// `_`, discards the value
    Wild,
    /// A named variable
    Id(String),
    /// `object.member`
    Member { object: Box<Lhs>, member: String },
    /// `object[index]`
    Index { object: Box<Lhs>, index: Box<Expr> },
    /// Tuple pattern `(a, b, ...)`
    Tuple(Vec<Lhs>),
}

impl Lhs {
    pub fn new(kind: LhsKind, ty: Type) -> Self {
        Self {
            kind,
            ty,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn wild(ty: Type) -> Self {
        Self::new(LhsKind::Wild, ty)
    }

    pub fn id(name: impl Into<String>, ty: Type) -> Self {
        Self::new(LhsKind::Id(name.into()), ty)
    }

    pub fn member(object: Lhs, member: impl Into<String>, ty: Type) -> Self {
        Self::new(
            LhsKind::Member {
                object: Box::new(object),
                member: member.into(),
            },
            ty,
        )
    }

    pub fn index(object: Lhs, index: Expr) -> Self {
        let ty = object.ty.array_elem().cloned().unwrap_or(Type::Void);
        Self::new(
            LhsKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            ty,
        )
    }

    pub fn tuple(elems: Vec<Lhs>) -> Self {
        let ty = Type::Tuple(elems.iter().map(|e| e.ty.clone()).collect());
        Self::new(LhsKind::Tuple(elems), ty)
    }

    pub fn is_wild(&self) -> bool {
        matches!(self.kind, LhsKind::Wild)
    }

    /// Names of the variables this target writes or reads.
    ///
    /// For `a[i]` both `a` and `i` are reported: either can alias a
    /// right-hand side of a simultaneous assignment.
    pub fn referenced_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        super::walk::walk_lhs(self, &mut |name| {
            if !ids.iter().any(|id| id == name) {
                ids.push(name.to_string());
            }
        });
        ids
    }

    /// The expression reading back what this target stores.
    ///
    /// Returns `None` for wildcards and tuple patterns, which have no single
    /// readable location.
    pub fn to_expr(&self) -> Option<Expr> {
        let kind = match &self.kind {
            LhsKind::Wild | LhsKind::Tuple(_) => return None,
            LhsKind::Id(name) => ExprKind::Id(name.clone()),
            LhsKind::Member { object, member } => ExprKind::Member {
                object: Box::new(object.to_expr()?),
                member: member.clone(),
            },
            LhsKind::Index { object, index } => ExprKind::Index {
                object: Box::new(object.to_expr()?),
                index: index.clone(),
            },
        };
        Some(Expr::new(kind, self.ty.clone()).with_span(self.span))
    }
}
