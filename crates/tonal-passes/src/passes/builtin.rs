//! Builtin simplification.

use tonal_ast::mapper::{Env, Rewrite};
use tonal_ast::{BinaryOp, Expr, ExprKind};

use super::PassState;

/// Folds the trivial builtins into core forms.
///
/// - `not(x)` becomes `x == false`
/// - `size(a)` on a fixed-size array becomes the literal dimension
pub struct Builtin;

impl Rewrite<PassState> for Builtin {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn expr(&self, _env: &Env<'_>, _state: &mut PassState, expr: Expr) -> Expr {
        let Expr { kind, ty, span } = expr;
        let (path, mut args) = match kind {
            ExprKind::Call { path, args } => (path, args),
            kind => return Expr { kind, ty, span },
        };

        if path.len() == 1 && args.len() == 1 {
            match path.last() {
                Some("not") => {
                    let operand = args.remove(0);
                    return Expr::binary(BinaryOp::Eq, operand, Expr::bool(false)).with_span(span);
                }
                Some("size") => {
                    if let Some(size) = args[0].ty.array_size() {
                        return Expr::int(size as i64).with_span(span);
                    }
                }
                _ => {}
            }
        }

        Expr {
            kind: ExprKind::Call { path, args },
            ty,
            span,
        }
    }
}
