//! Environment-and-state-threading AST rewrite framework.
//!
//! A pass implements [`Rewrite`] and overrides only the node kinds it cares
//! about. A [`Mapper`] composes passes into a single traversal:
//!
//! - **Post-order** - children are rewritten before their parent, so every
//!   handler sees already-normalized children
//! - **Composition** - at each node, the handlers of all passes run in the
//!   order the passes were given, each seeing the previous one's output
//! - **Environment** - [`Env`] is computed top-down (enclosing declaration,
//!   expression context) and never written back up
//! - **State** - one `&mut S` threaded left to right through siblings; the
//!   mapper never inspects it
//! - **Expansion** - statement and declaration handlers return a list, so one
//!   node can become zero or many
//!
//! A statement's nested blocks are mapped before its own expressions. Anything
//! a pass queues in its state while rewriting those expressions is therefore
//! still pending when the statement itself reaches the pass's statement
//! handler, which can emit it in front of the statement.

use crate::ast::{Decl, Expr, ExprKind, Lhs, LhsKind, Program, Stmt, TypeTable};
use crate::foundation::Path;

/// Where an expression sits relative to its enclosing constructs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExprContext {
    /// An ordinary value position
    #[default]
    Value,
    /// The whole right-hand side of a declaration, assignment or return
    StatementRhs,
    /// Inside a conditional expression (its condition or either branch)
    Conditional,
    /// Inside a `while` condition, re-evaluated on every iteration
    LoopCondition,
}

impl ExprContext {
    /// Context inherited by the children of a node of the given kind.
    fn for_children(self, kind: &ExprKind) -> Self {
        match self {
            ExprContext::Conditional | ExprContext::LoopCondition => self,
            ExprContext::Value | ExprContext::StatementRhs => match kind {
                ExprKind::If { .. } => ExprContext::Conditional,
                _ => ExprContext::Value,
            },
        }
    }
}

/// The declaration enclosing the node being rewritten.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Type(Path),
    Function(Path),
    External(Path),
}

impl Scope {
    /// Scope of everything inside `decl`.
    pub fn of(decl: &Decl) -> Self {
        match decl {
            Decl::Type(t) => Scope::Type(t.name.clone()),
            Decl::Function(f) => Scope::Function(f.name.clone()),
            Decl::External(e) => Scope::External(e.name.clone()),
        }
    }

    /// Name of the enclosing declaration.
    pub fn name(&self) -> &Path {
        match self {
            Scope::Type(name) | Scope::Function(name) | Scope::External(name) => name,
        }
    }
}

/// Top-down environment handed to every handler.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    /// Declared types and function signatures
    pub types: &'a TypeTable,
    /// Enclosing declaration
    pub scope: &'a Scope,
    /// Position of the current expression
    pub context: ExprContext,
}

impl<'a> Env<'a> {
    pub fn new(types: &'a TypeTable, scope: &'a Scope) -> Self {
        Self {
            types,
            scope,
            context: ExprContext::Value,
        }
    }

    /// The same environment at a different expression position.
    pub fn in_context(&self, context: ExprContext) -> Self {
        Self { context, ..*self }
    }
}

/// A rewrite pass over the AST.
///
/// Every handler defaults to the identity, so a pass overrides only what it
/// rewrites. `S` is the state shared by all passes composed into one
/// [`Mapper`].
pub trait Rewrite<S> {
    /// Pass name, for logging.
    fn name(&self) -> &'static str;

    /// Rewrite one expression whose children are already rewritten.
    fn expr(&self, _env: &Env<'_>, _state: &mut S, expr: Expr) -> Expr {
        expr
    }

    /// Expand one statement into zero or more statements.
    fn stmt(&self, _env: &Env<'_>, _state: &mut S, stmt: Stmt) -> Vec<Stmt> {
        vec![stmt]
    }

    /// Expand one top-level declaration into zero or more declarations.
    fn decl(&self, _env: &Env<'_>, _state: &mut S, decl: Decl) -> Vec<Decl> {
        vec![decl]
    }
}

/// Left-to-right composition of passes applied in a single traversal.
pub struct Mapper<'p, S> {
    passes: Vec<&'p dyn Rewrite<S>>,
}

impl<'p, S> Default for Mapper<'p, S> {
    fn default() -> Self {
        Self { passes: Vec::new() }
    }
}

impl<'p, S> Mapper<'p, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass; it runs after every pass already added.
    pub fn with(mut self, pass: &'p dyn Rewrite<S>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Names of the composed passes, in application order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Rewrite a whole program.
    pub fn map_program(&self, types: &TypeTable, state: &mut S, program: Program) -> Program {
        let mut decls = Vec::with_capacity(program.decls.len());
        for decl in program.decls {
            decls.extend(self.map_decl(types, state, decl));
        }
        Program { decls }
    }

    fn map_decl(&self, types: &TypeTable, state: &mut S, decl: Decl) -> Vec<Decl> {
        let scope = Scope::of(&decl);
        let env = Env::new(types, &scope);

        let decl = match decl {
            Decl::Function(mut f) => {
                f.body = self.map_stmts(&env, state, f.body);
                Decl::Function(f)
            }
            other => other,
        };

        let mut out = vec![decl];
        for pass in &self.passes {
            out = out
                .into_iter()
                .flat_map(|d| pass.decl(&env, state, d))
                .collect();
        }
        out
    }

    /// Rewrite a statement list, splicing in every expansion.
    pub fn map_stmts(&self, env: &Env<'_>, state: &mut S, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.extend(self.map_stmt(env, state, stmt));
        }
        out
    }

    fn map_stmt(&self, env: &Env<'_>, state: &mut S, stmt: Stmt) -> Vec<Stmt> {
        let value = env.in_context(ExprContext::Value);
        let rhs = env.in_context(ExprContext::StatementRhs);

        let stmt = match stmt {
            Stmt::Decl { lhs, rhs: init, span } => {
                let lhs = self.map_lhs(&value, state, lhs);
                let init = init.map(|e| self.map_expr(&rhs, state, e));
                Stmt::Decl {
                    lhs,
                    rhs: init,
                    span,
                }
            }
            Stmt::Bind {
                lhs,
                rhs: source,
                span,
            } => {
                let lhs = self.map_lhs(&value, state, lhs);
                let source = self.map_expr(&rhs, state, source);
                Stmt::Bind {
                    lhs,
                    rhs: source,
                    span,
                }
            }
            Stmt::Return { value: ret, span } => Stmt::Return {
                value: self.map_expr(&rhs, state, ret),
                span,
            },
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                let then_branch = self.map_stmts(&value, state, then_branch);
                let else_branch = self.map_stmts(&value, state, else_branch);
                let cond = self.map_expr(&value, state, cond);
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                    span,
                }
            }
            Stmt::While { cond, body, span } => {
                let body = self.map_stmts(&value, state, body);
                let cond = self.map_expr(&env.in_context(ExprContext::LoopCondition), state, cond);
                Stmt::While { cond, body, span }
            }
        };

        let mut out = vec![stmt];
        for pass in &self.passes {
            out = out
                .into_iter()
                .flat_map(|s| pass.stmt(&value, state, s))
                .collect();
        }
        out
    }

    fn map_lhs(&self, env: &Env<'_>, state: &mut S, lhs: Lhs) -> Lhs {
        let Lhs { kind, ty, span } = lhs;
        let kind = match kind {
            LhsKind::Member { object, member } => LhsKind::Member {
                object: Box::new(self.map_lhs(env, state, *object)),
                member,
            },
            LhsKind::Index { object, index } => LhsKind::Index {
                object: Box::new(self.map_lhs(env, state, *object)),
                index: Box::new(self.map_expr(env, state, *index)),
            },
            LhsKind::Tuple(elems) => LhsKind::Tuple(
                elems
                    .into_iter()
                    .map(|e| self.map_lhs(env, state, e))
                    .collect(),
            ),
            leaf @ (LhsKind::Wild | LhsKind::Id(_)) => leaf,
        };
        Lhs { kind, ty, span }
    }

    /// Rewrite an expression bottom-up.
    pub fn map_expr(&self, env: &Env<'_>, state: &mut S, expr: Expr) -> Expr {
        let Expr { kind, ty, span } = expr;
        let inner = env.in_context(env.context.for_children(&kind));

        let kind = match kind {
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: Box::new(self.map_expr(&inner, state, *operand)),
            },
            ExprKind::Binary { op, left, right } => {
                let left = self.map_expr(&inner, state, *left);
                let right = self.map_expr(&inner, state, *right);
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.map_expr(&inner, state, *cond);
                let then_branch = self.map_expr(&inner, state, *then_branch);
                let else_branch = self.map_expr(&inner, state, *else_branch);
                ExprKind::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                }
            }
            ExprKind::Array(elems) => ExprKind::Array(self.map_exprs(&inner, state, elems)),
            ExprKind::Tuple(elems) => ExprKind::Tuple(self.map_exprs(&inner, state, elems)),
            ExprKind::Index { object, index } => {
                let object = self.map_expr(&inner, state, *object);
                let index = self.map_expr(&inner, state, *index);
                ExprKind::Index {
                    object: Box::new(object),
                    index: Box::new(index),
                }
            }
            ExprKind::Member { object, member } => ExprKind::Member {
                object: Box::new(self.map_expr(&inner, state, *object)),
                member,
            },
            ExprKind::Call { path, args } => ExprKind::Call {
                path,
                args: self.map_exprs(&inner, state, args),
            },
            leaf @ (ExprKind::Unit
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Real(_)
            | ExprKind::String(_)
            | ExprKind::Id(_)) => leaf,
        };

        let mut expr = Expr { kind, ty, span };
        for pass in &self.passes {
            expr = pass.expr(env, state, expr);
        }
        expr
    }

    fn map_exprs(&self, env: &Env<'_>, state: &mut S, exprs: Vec<Expr>) -> Vec<Expr> {
        exprs
            .into_iter()
            .map(|e| self.map_expr(env, state, e))
            .collect()
    }
}
