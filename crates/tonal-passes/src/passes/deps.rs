//! Dependency collection.
//!
//! Records "declaration A mentions declaration B" edges for linearization:
//! calls inside function bodies, and struct-typed members inside type
//! declarations. Types and functions are tracked in separate graphs.

use serde::Serialize;
use tonal_ast::mapper::{Env, Mapper, Rewrite, Scope};
use tonal_ast::{Decl, Expr, ExprKind, Path, Program, TypeTable};

use super::PassState;
use crate::graph::Graph;

/// Dependency graphs of a program.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    /// Type to referenced struct type
    pub types: Graph<Path>,
    /// Function to called function (externals included)
    pub functions: Graph<Path>,
}

impl Dependencies {
    /// Graphs with every declared name registered and no edges yet.
    pub fn seeded(program: &Program) -> Self {
        let mut deps = Self::default();
        for decl in &program.decls {
            match decl {
                Decl::Type(t) => deps.types.add_vertex(t.name.clone()),
                Decl::Function(f) => deps.functions.add_vertex(f.name.clone()),
                Decl::External(e) => deps.functions.add_vertex(e.name.clone()),
            }
        }
        deps
    }

    /// Direct dependencies of `name`, looked up in the graph for its kind.
    pub fn of(&self, name: &Path) -> &[Path] {
        if self.types.contains(name) {
            self.types.dependencies(name)
        } else {
            self.functions.dependencies(name)
        }
    }

    /// Edge lists in a serializable form, for diagnostics.
    pub fn edges(&self) -> DependencyEdges {
        let collect = |graph: &Graph<Path>| -> Vec<(String, Vec<String>)> {
            graph
                .vertices()
                .map(|v| {
                    let deps: Vec<String> =
                        graph.dependencies(v).iter().map(Path::to_string).collect();
                    (v.to_string(), deps)
                })
                .collect()
        };
        DependencyEdges {
            types: collect(&self.types),
            functions: collect(&self.functions),
        }
    }
}

/// Flattened edge lists keyed by declaration name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyEdges {
    pub types: Vec<(String, Vec<String>)>,
    pub functions: Vec<(String, Vec<String>)>,
}

/// Fills [`PassState::deps`]; never changes the program.
///
/// Seed the graphs with [`Dependencies::seeded`] before running it.
pub struct DependencyCollection;

impl Rewrite<PassState> for DependencyCollection {
    fn name(&self) -> &'static str {
        "dependency_collection"
    }

    fn expr(&self, env: &Env<'_>, state: &mut PassState, expr: Expr) -> Expr {
        if let (Scope::Function(name), ExprKind::Call { path, .. }) = (env.scope, &expr.kind) {
            state.deps.functions.add_edge(name.clone(), path.clone());
        }
        expr
    }

    fn decl(&self, _env: &Env<'_>, state: &mut PassState, decl: Decl) -> Vec<Decl> {
        if let Decl::Type(t) = &decl {
            for member in &t.members {
                for referenced in member.ty.referenced_structs() {
                    state.deps.types.add_edge(t.name.clone(), referenced.clone());
                }
            }
        }
        vec![decl]
    }
}

/// Collect the dependency graphs of `program`.
pub fn collect(program: Program, types: &TypeTable) -> (Program, Dependencies) {
    let mut state = PassState::new();
    state.deps = Dependencies::seeded(&program);
    let program = Mapper::<PassState>::new()
        .with(&DependencyCollection)
        .map_program(types, &mut state, program);
    (program, state.deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonal_ast::{ExternDecl, FunctionDecl, Lhs, Member, Param, Stmt, Type, TypeDecl};

    fn call(name: &str) -> Stmt {
        Stmt::bind(
            Lhs::wild(Type::Int),
            Expr::call(name, vec![], Type::Int),
        )
    }

    fn program() -> Program {
        Program::new(vec![
            Decl::Type(TypeDecl::new(
                "Voice",
                vec![
                    Member::new("env", Type::named("Env")),
                    Member::new("osc", Type::array(Type::named("Osc"), 2)),
                ],
            )),
            Decl::Type(TypeDecl::new("Env", vec![Member::new("level", Type::Real)])),
            Decl::Type(TypeDecl::new("Osc", vec![])),
            Decl::External(ExternDecl::new("now", vec![], Type::Int)),
            Decl::Function(FunctionDecl::new(
                "process",
                vec![Param::new("v", Type::named("Voice"))],
                Type::Void,
                vec![call("step"), Stmt::if_(Expr::bool(true), vec![call("now")], vec![])],
            )),
            Decl::Function(FunctionDecl::new("step", vec![], Type::Int, vec![])),
        ])
    }

    #[test]
    fn test_every_declaration_is_seeded() {
        let deps = Dependencies::seeded(&program());
        assert_eq!(deps.types.len(), 3);
        assert_eq!(deps.functions.len(), 3);
        assert!(deps.of(&Path::from("step")).is_empty());
    }

    #[test]
    fn test_call_and_member_edges() {
        let program = program();
        let types = TypeTable::from_program(&program);
        let (out, deps) = collect(program.clone(), &types);

        assert_eq!(out, program);
        assert_eq!(
            deps.of(&Path::from("process")),
            &[Path::from("step"), Path::from("now")]
        );
        assert_eq!(
            deps.of(&Path::from("Voice")),
            &[Path::from("Env"), Path::from("Osc")]
        );
        assert!(deps.of(&Path::from("Env")).is_empty());
    }

    #[test]
    fn test_edges_serialize() {
        let program = program();
        let types = TypeTable::from_program(&program);
        let (_, deps) = collect(program, &types);

        let json = serde_json::to_value(deps.edges()).unwrap();
        assert_eq!(json["types"][0][0], "Voice");
        assert_eq!(json["types"][0][1][1], "Osc");
    }
}
