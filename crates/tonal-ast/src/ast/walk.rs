//! Read-only tree walking utilities.
//!
//! Shared pre-order traversal for analyses that only inspect the tree
//! (collecting referenced names, declared locals, ...). Rewrites go through
//! [`crate::mapper`] instead.
//!
//! Closure-based on purpose: callers own their accumulator and the traversal
//! order is fixed (node first, then children left to right).

use super::expr::{Expr, ExprKind, Lhs, LhsKind};
use super::stmt::Stmt;

/// Recursively walk an expression tree in pre-order, calling `visitor` for each node.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(cond, visitor);
            walk_expr(then_branch, visitor);
            walk_expr(else_branch, visitor);
        }
        ExprKind::Array(elems) | ExprKind::Tuple(elems) => {
            for elem in elems {
                walk_expr(elem, visitor);
            }
        }
        ExprKind::Index { object, index } => {
            walk_expr(object, visitor);
            walk_expr(index, visitor);
        }
        ExprKind::Member { object, .. } => walk_expr(object, visitor),
        ExprKind::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }

        ExprKind::Unit
        | ExprKind::Bool(_)
        | ExprKind::Int(_)
        | ExprKind::Real(_)
        | ExprKind::String(_)
        | ExprKind::Id(_) => {}
    }
}

/// Walk the variable names an assignment target mentions, left to right.
///
/// Index expressions inside the target are walked too, since they are read.
pub fn walk_lhs<V>(lhs: &Lhs, visitor: &mut V)
where
    V: FnMut(&str),
{
    match &lhs.kind {
        LhsKind::Wild => {}
        LhsKind::Id(name) => visitor(name),
        LhsKind::Member { object, .. } => walk_lhs(object, visitor),
        LhsKind::Index { object, index } => {
            walk_lhs(object, visitor);
            walk_expr(index, &mut |node| {
                if let ExprKind::Id(name) = &node.kind {
                    visitor(name);
                }
            });
        }
        LhsKind::Tuple(elems) => {
            for elem in elems {
                walk_lhs(elem, visitor);
            }
        }
    }
}

/// Walk a statement list in pre-order, descending into nested blocks.
pub fn walk_stmts<V>(stmts: &[Stmt], visitor: &mut V)
where
    V: FnMut(&Stmt),
{
    for stmt in stmts {
        visitor(stmt);
        match stmt {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                walk_stmts(then_branch, visitor);
                walk_stmts(else_branch, visitor);
            }
            Stmt::While { body, .. } => walk_stmts(body, visitor),
            Stmt::Decl { .. } | Stmt::Bind { .. } | Stmt::Return { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Type};

    #[test]
    fn test_walk_leaf_node() {
        let expr = Expr::int(1);
        let mut visit_count = 0;
        walk_expr(&expr, &mut |_| visit_count += 1);
        assert_eq!(visit_count, 1, "Leaf node should be visited exactly once");
    }

    #[test]
    fn test_walk_visits_all_if_parts() {
        // if x > 0 then 1 else -1
        let expr = Expr::if_(
            Expr::binary(BinaryOp::Gt, Expr::id("x", Type::Int), Expr::int(0)),
            Expr::int(1),
            Expr::int(-1),
        );
        let mut visit_count = 0;
        walk_expr(&expr, &mut |_| visit_count += 1);
        // If + Binary + x + 0 + 1 + -1
        assert_eq!(visit_count, 6);
    }

    #[test]
    fn test_walk_stmts_descends_into_blocks() {
        let body = vec![
            Stmt::decl(Lhs::id("a", Type::Int), None),
            Stmt::while_(
                Expr::bool(true),
                vec![Stmt::if_(
                    Expr::bool(false),
                    vec![Stmt::decl(Lhs::id("b", Type::Int), None)],
                    vec![],
                )],
            ),
        ];
        let mut decls = Vec::new();
        walk_stmts(&body, &mut |stmt| {
            if let Stmt::Decl { lhs, .. } = stmt {
                decls.push(lhs.referenced_ids());
            }
        });
        assert_eq!(decls, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }
}
