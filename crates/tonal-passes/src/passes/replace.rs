//! Call-signature rewriting.
//!
//! Backends provide target-specific overloads of generic operations (a
//! fixed-point `sin`, a real-valued `clip`, ...). The replacement table maps
//! a call, identified by its path, argument types and result type, to the
//! overload that implements it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tonal_ast::mapper::{Env, Rewrite};
use tonal_ast::{Expr, ExprKind, Path, Type};

use super::PassState;

/// One replacement rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    /// Called name
    pub name: Path,
    /// Argument types, in order
    #[serde(default)]
    pub args: Vec<Type>,
    /// Expected result type
    pub ret: Type,
    /// Replacement call target
    pub target: Path,
}

type Key = (Path, Vec<Type>, Type);

/// Lookup from call signature to replacement target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Replacement>", into = "Vec<Replacement>")]
pub struct ReplacementTable {
    rules: IndexMap<Key, Path>,
}

impl ReplacementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; a later rule for the same signature wins.
    pub fn insert(&mut self, rule: Replacement) {
        self.rules.insert((rule.name, rule.args, rule.ret), rule.target);
    }

    /// Target for a call of `name` with these argument and result types.
    pub fn lookup(&self, name: &Path, args: &[Type], ret: &Type) -> Option<&Path> {
        self.rules.get(&(name.clone(), args.to_vec(), ret.clone()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<Replacement>> for ReplacementTable {
    fn from(rules: Vec<Replacement>) -> Self {
        let mut table = Self::new();
        for rule in rules {
            table.insert(rule);
        }
        table
    }
}

impl From<ReplacementTable> for Vec<Replacement> {
    fn from(table: ReplacementTable) -> Self {
        table
            .rules
            .into_iter()
            .map(|((name, args, ret), target)| Replacement {
                name,
                args,
                ret,
                target,
            })
            .collect()
    }
}

/// Retargets calls that have a replacement; all other calls are left alone.
pub struct SimpleReplacements<'t> {
    table: &'t ReplacementTable,
}

impl<'t> SimpleReplacements<'t> {
    pub fn new(table: &'t ReplacementTable) -> Self {
        Self { table }
    }
}

impl Rewrite<PassState> for SimpleReplacements<'_> {
    fn name(&self) -> &'static str {
        "simple_replacements"
    }

    fn expr(&self, _env: &Env<'_>, _state: &mut PassState, mut expr: Expr) -> Expr {
        if self.table.is_empty() {
            return expr;
        }
        if let ExprKind::Call { path, args } = &mut expr.kind {
            let arg_types: Vec<Type> = args.iter().map(|a| a.ty.clone()).collect();
            if let Some(target) = self.table.lookup(path, &arg_types, &expr.ty) {
                *path = target.clone();
            }
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonal_ast::mapper::{Mapper, Scope};
    use tonal_ast::TypeTable;

    fn table() -> ReplacementTable {
        let json = r#"[
            {"name": "sin", "args": ["fix16"], "ret": "fix16", "target": "fix_sin"},
            {"name": "clip", "args": ["real", "real", "real"], "ret": "real", "target": "clip_f"}
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    fn rewrite(table: &ReplacementTable, expr: Expr) -> Expr {
        let types = TypeTable::new();
        let scope = Scope::Function(Path::from("f"));
        let env = Env::new(&types, &scope);
        let pass = SimpleReplacements::new(table);
        Mapper::<PassState>::new()
            .with(&pass)
            .map_expr(&env, &mut PassState::new(), expr)
    }

    #[test]
    fn test_table_loads_from_rules() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&Path::from("sin"), &[Type::Fix16], &Type::Fix16),
            Some(&Path::from("fix_sin"))
        );
    }

    #[test]
    fn test_matching_call_is_retargeted() {
        let call = Expr::call("sin", vec![Expr::id("x", Type::Fix16)], Type::Fix16);
        let out = rewrite(&table(), call);
        match out.kind {
            ExprKind::Call { path, .. } => assert_eq!(path, "fix_sin"),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_signature_mismatch_is_a_no_op() {
        let call = Expr::call("sin", vec![Expr::real(1.0)], Type::Real);
        assert_eq!(rewrite(&table(), call.clone()), call);
    }
}
