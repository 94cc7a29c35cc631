//! Tuple elimination.
//!
//! Neither the VM nor the text backends have multi-value returns or tuple
//! variables, so tuples are taken apart:
//!
//! - **Declarations** - `val (a, b) = e` declares each component separately;
//!   wildcard declarations disappear
//! - **Assignments** - `(a, b) = (x, y)` becomes component assignments,
//!   through temporaries when the two sides share a variable (`(a, b) = (b, a)`)
//! - **Calls** - a call returning a tuple writes its results into the
//!   `_ret_N` members of a context value the caller passes first, and the
//!   caller reads them back
//! - **Returns** - `return (x, y)` stores into the function's own `_ctx`
//!   parameter and returns unit
//! - **Signatures** - a tuple-returning `f` gains a leading `_ctx: f_ctx`
//!   parameter and returns unit; the `f_ctx` struct is added next to it

use tonal_ast::mapper::{Env, Rewrite, Scope};
use tonal_ast::{
    Decl, Expr, ExprKind, Lhs, LhsKind, Member, Param, Span, Stmt, Type, TypeDecl,
};

use super::{ret_member, PassState, CALL_CTX, CTX_PARAM, CTX_SUFFIX, TUPLE_TEMP};

const PASS: &str = "tuple_elimination";

pub struct TupleElimination;

impl Rewrite<PassState> for TupleElimination {
    fn name(&self) -> &'static str {
        PASS
    }

    fn stmt(&self, env: &Env<'_>, state: &mut PassState, stmt: Stmt) -> Vec<Stmt> {
        match stmt {
            Stmt::Decl { lhs, rhs, span } => expand_decl(env, state, lhs, rhs, span),
            Stmt::Bind { lhs, rhs, span } => expand_bind(env, state, lhs, rhs, span),
            Stmt::Return { value, span } => expand_return(env, state, value, span),
            other => vec![other],
        }
    }

    fn decl(&self, _env: &Env<'_>, state: &mut PassState, decl: Decl) -> Vec<Decl> {
        let mut f = match decl {
            Decl::Function(f) if f.ret.is_tuple() => f,
            other => return vec![other],
        };

        let ctx = f.name.with_suffix(CTX_SUFFIX);
        let members = f
            .ret
            .tuple_elems()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, ty)| Member::new(ret_member(i), ty.clone()))
            .collect();
        let mut ctx_decl = TypeDecl::new(ctx.clone(), members);
        ctx_decl.span = f.span;

        f.params.insert(0, Param::new(CTX_PARAM, Type::Struct(ctx)));
        f.ret = Type::Void;
        state.request_repeat(PASS);

        vec![Decl::Type(ctx_decl), Decl::Function(f)]
    }
}

fn expand_decl(
    env: &Env<'_>,
    state: &mut PassState,
    lhs: Lhs,
    rhs: Option<Expr>,
    span: Span,
) -> Vec<Stmt> {
    match (lhs.kind, rhs) {
        (LhsKind::Wild, None) => {
            state.request_repeat(PASS);
            vec![]
        }
        (LhsKind::Wild, Some(rhs)) => {
            state.request_repeat(PASS);
            let discard = Lhs::wild(lhs.ty).with_span(lhs.span);
            expand_bind(env, state, discard, rhs, span)
        }
        (LhsKind::Tuple(elems), rhs) => {
            state.request_repeat(PASS);
            let pattern = Lhs {
                kind: LhsKind::Tuple(elems),
                ty: lhs.ty,
                span: lhs.span,
            };
            match rhs {
                Some(rhs) if disjoint(&pattern, &rhs) => match components(pattern, rhs) {
                    Ok(pairs) => pairs
                        .into_iter()
                        .flat_map(|(l, r)| expand_decl(env, state, l, Some(r), span))
                        .collect(),
                    Err((pattern, rhs)) => declare_then_bind(env, state, pattern, Some(rhs), span),
                },
                rhs => declare_then_bind(env, state, pattern, rhs, span),
            }
        }
        (kind, Some(rhs)) if is_tuple_call(env, &rhs) => {
            let target = Lhs {
                kind,
                ty: lhs.ty,
                span: lhs.span,
            };
            let mut out = vec![Stmt::decl(target.clone(), None).with_span(span)];
            out.extend(expand_bind(env, state, target, rhs, span));
            out
        }
        (kind, rhs) => vec![Stmt::Decl {
            lhs: Lhs {
                kind,
                ty: lhs.ty,
                span: lhs.span,
            },
            rhs,
            span,
        }],
    }
}

/// Declare every component of `pattern`, then assign `rhs` to it.
fn declare_then_bind(
    env: &Env<'_>,
    state: &mut PassState,
    pattern: Lhs,
    rhs: Option<Expr>,
    span: Span,
) -> Vec<Stmt> {
    let mut out = Vec::new();
    if let LhsKind::Tuple(elems) = &pattern.kind {
        for elem in elems {
            out.extend(expand_decl(env, state, elem.clone(), None, span));
        }
    }
    if let Some(rhs) = rhs {
        out.extend(expand_bind(env, state, pattern, rhs, span));
    }
    out
}

fn expand_bind(env: &Env<'_>, state: &mut PassState, lhs: Lhs, rhs: Expr, span: Span) -> Vec<Stmt> {
    if is_tuple_call(env, &rhs) {
        state.request_repeat(PASS);
        return expand_call(env, state, lhs, rhs, span);
    }

    let parallel = disjoint(&lhs, &rhs);
    let pairs = match components(lhs, rhs) {
        Ok(pairs) => pairs,
        Err((lhs, rhs)) => return vec![Stmt::Bind { lhs, rhs, span }],
    };
    state.request_repeat(PASS);

    if parallel {
        return pairs
            .into_iter()
            .flat_map(|(l, r)| expand_bind(env, state, l, r, span))
            .collect();
    }

    let mut out = Vec::new();
    let mut copies = Vec::with_capacity(pairs.len());
    for (target, value) in pairs {
        let name = state.fresh(env.scope.name(), TUPLE_TEMP);
        let temp = Lhs::id(name.clone(), value.ty.clone()).with_span(value.span);
        copies.push((target, Expr::id(name, value.ty.clone()).with_span(value.span)));
        out.extend(expand_decl(env, state, temp, Some(value), span));
    }
    for (target, temp) in copies {
        out.extend(expand_bind(env, state, target, temp, span));
    }
    out
}

/// `lhs = f(args)` with a tuple result, through a fresh context local.
fn expand_call(env: &Env<'_>, state: &mut PassState, lhs: Lhs, call: Expr, span: Span) -> Vec<Stmt> {
    let Expr {
        kind,
        ty,
        span: at,
    } = call;
    let (path, args) = match kind {
        ExprKind::Call { path, args } => (path, args),
        kind => {
            let rhs = Expr { kind, ty, span: at };
            return vec![Stmt::Bind { lhs, rhs, span }];
        }
    };

    let ctx_ty = Type::Struct(path.with_suffix(CTX_SUFFIX));
    let ctx = state.fresh(env.scope.name(), CALL_CTX);
    let ctx_ref = || Expr::id(ctx.clone(), ctx_ty.clone()).with_span(at);

    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(ctx_ref());
    call_args.extend(args);

    let mut out = vec![
        Stmt::decl(Lhs::id(ctx.clone(), ctx_ty.clone()).with_span(at), None).with_span(span),
        Stmt::bind(
            Lhs::wild(Type::Void).with_span(at),
            Expr::call(path, call_args, Type::Void).with_span(at),
        )
        .with_span(span),
    ];

    if !lhs.is_wild() {
        let results = ty
            .tuple_elems()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, elem)| Expr::member(ctx_ref(), ret_member(i), elem.clone()).with_span(at))
            .collect();
        out.extend(expand_bind(env, state, lhs, Expr::tuple(results).with_span(at), span));
    }
    out
}

fn expand_return(env: &Env<'_>, state: &mut PassState, value: Expr, span: Span) -> Vec<Stmt> {
    let name = match env.scope {
        Scope::Function(name) if value.ty.is_tuple() => name,
        _ => return vec![Stmt::Return { value, span }],
    };
    state.request_repeat(PASS);

    let Expr {
        kind,
        ty,
        span: at,
    } = value;
    match kind {
        ExprKind::Tuple(values) => {
            let ctx_ty = Type::Struct(name.with_suffix(CTX_SUFFIX));
            let mut out: Vec<Stmt> = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| {
                    let ctx = Lhs::id(CTX_PARAM, ctx_ty.clone()).with_span(v.span);
                    let slot = Lhs::member(ctx, ret_member(i), v.ty.clone()).with_span(v.span);
                    Stmt::bind(slot, v).with_span(span)
                })
                .collect();
            out.push(Stmt::ret(Expr::unit().with_span(at)).with_span(span));
            out
        }
        kind => {
            let temps: Vec<(String, Type)> = ty
                .tuple_elems()
                .unwrap_or_default()
                .iter()
                .map(|elem| (state.fresh(name, TUPLE_TEMP), elem.clone()))
                .collect();
            let pattern = Lhs::tuple(
                temps
                    .iter()
                    .map(|(n, t)| Lhs::id(n.clone(), t.clone()).with_span(at))
                    .collect(),
            )
            .with_span(at);
            let result = Expr::tuple(
                temps
                    .into_iter()
                    .map(|(n, t)| Expr::id(n, t).with_span(at))
                    .collect(),
            )
            .with_span(at);

            let value = Expr { kind, ty, span: at };
            let mut out = expand_decl(env, state, pattern, Some(value), span);
            out.extend(expand_return(env, state, result, span));
            out
        }
    }
}

/// A call to a defined function whose result is a tuple.
fn is_tuple_call(env: &Env<'_>, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { path, .. } => {
            expr.ty.is_tuple() && env.types.signature(path).is_some_and(|sig| !sig.external)
        }
        _ => false,
    }
}

/// No variable is both written by `lhs` and read by `rhs`.
fn disjoint(lhs: &Lhs, rhs: &Expr) -> bool {
    let read = rhs.referenced_ids();
    lhs.referenced_ids().iter().all(|id| !read.contains(id))
}

/// Pair up a tuple pattern with a tuple literal of the same arity.
fn components(lhs: Lhs, rhs: Expr) -> Result<Vec<(Lhs, Expr)>, (Lhs, Expr)> {
    match (lhs.kind, rhs.kind) {
        (LhsKind::Tuple(ls), ExprKind::Tuple(rs)) if ls.len() == rs.len() => {
            Ok(ls.into_iter().zip(rs).collect())
        }
        (lk, rk) => Err((
            Lhs {
                kind: lk,
                ty: lhs.ty,
                span: lhs.span,
            },
            Expr {
                kind: rk,
                ty: rhs.ty,
                span: rhs.span,
            },
        )),
    }
}

#[cfg(test)]
mod tests;
