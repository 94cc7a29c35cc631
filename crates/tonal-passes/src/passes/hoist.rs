//! Conditional-expression hoisting.
//!
//! The VM and the text backends execute conditionals as statements only. A
//! conditional used as a value is replaced by a temporary that an `if`
//! statement, emitted just before the enclosing statement, assigns in each
//! branch:
//!
//! ```text
//! y = g(if c then a else b);      val _if_temp_0 : T;
//!                           =>    if (c) _if_temp_0 = a; else _if_temp_0 = b;
//!                                 y = g(_if_temp_0);
//! ```
//!
//! A conditional that is the whole right-hand side of a declaration,
//! assignment or return needs no temporary; the statement itself becomes an
//! `if`. Conditionals nested inside another conditional are left for the
//! next iteration, once the outer one has become a statement. Conditionals
//! in a `while` condition are never hoisted since the condition is
//! re-evaluated on every iteration.

use tonal_ast::mapper::{Env, ExprContext, Rewrite};
use tonal_ast::{Expr, ExprKind, Lhs, Span, Stmt};

use super::{PassState, IF_TEMP};

pub struct ConditionalHoist;

impl Rewrite<PassState> for ConditionalHoist {
    fn name(&self) -> &'static str {
        "conditional_hoist"
    }

    fn expr(&self, env: &Env<'_>, state: &mut PassState, expr: Expr) -> Expr {
        if env.context != ExprContext::Value || !expr.is_if() {
            return expr;
        }
        let (ty, span) = (expr.ty.clone(), expr.span);
        let (cond, then_branch, else_branch) = match split_if(expr) {
            Ok(parts) => parts,
            Err(expr) => return expr,
        };

        let temp = state.fresh(env.scope.name(), IF_TEMP);
        let target = Lhs::id(temp.clone(), ty.clone()).with_span(span);
        state.defer(Stmt::decl(target.clone(), None).with_span(span));
        state.defer(
            Stmt::if_(
                cond,
                vec![Stmt::bind(target.clone(), then_branch)],
                vec![Stmt::bind(target, else_branch)],
            )
            .with_span(span),
        );
        state.request_repeat(self.name());

        Expr::id(temp, ty).with_span(span)
    }

    fn stmt(&self, _env: &Env<'_>, state: &mut PassState, stmt: Stmt) -> Vec<Stmt> {
        let mut out = state.take_pending();
        match flatten(stmt) {
            Ok(flat) => {
                state.request_repeat(self.name());
                out.extend(flat);
            }
            Err(stmt) => out.push(stmt),
        }
        out
    }
}

/// Turn a statement whose whole right-hand side is a conditional into an
/// `if` statement, or hand it back unchanged.
fn flatten(stmt: Stmt) -> Result<Vec<Stmt>, Stmt> {
    match stmt {
        Stmt::Decl {
            lhs,
            rhs: Some(rhs),
            span,
        } => match split_if(rhs) {
            Ok((cond, a, b)) => Ok(vec![
                Stmt::decl(lhs.clone(), None).with_span(span),
                branch(cond, span, |e| Stmt::bind(lhs.clone(), e), a, b),
            ]),
            Err(rhs) => Err(Stmt::Decl {
                lhs,
                rhs: Some(rhs),
                span,
            }),
        },
        Stmt::Bind { lhs, rhs, span } => match split_if(rhs) {
            Ok((cond, a, b)) => Ok(vec![branch(
                cond,
                span,
                |e| Stmt::bind(lhs.clone(), e),
                a,
                b,
            )]),
            Err(rhs) => Err(Stmt::Bind { lhs, rhs, span }),
        },
        Stmt::Return { value, span } => match split_if(value) {
            Ok((cond, a, b)) => Ok(vec![branch(cond, span, Stmt::ret, a, b)]),
            Err(value) => Err(Stmt::Return { value, span }),
        },
        other => Err(other),
    }
}

fn branch(cond: Expr, span: Span, make: impl Fn(Expr) -> Stmt, a: Expr, b: Expr) -> Stmt {
    Stmt::if_(cond, vec![make(a)], vec![make(b)]).with_span(span)
}

fn split_if(expr: Expr) -> Result<(Expr, Expr, Expr), Expr> {
    let Expr { kind, ty, span } = expr;
    match kind {
        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => Ok((*cond, *then_branch, *else_branch)),
        kind => Err(Expr { kind, ty, span }),
    }
}
