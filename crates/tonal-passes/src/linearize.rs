//! Dependency-ordered linearization of top-level declarations.
//!
//! Declarations are partitioned into types, externals and functions, and the
//! program is rebuilt in that order. Types and functions are each put in
//! pull-in order:
//!
//! 1. Walk declarations in their current order, skipping visited ones
//! 2. Mark the declaration visited *before* recursing, so cycles terminate
//! 3. Pull in every unvisited dependency first, depth-first
//! 4. Emit the declaration
//!
//! Dependencies therefore precede dependents, except inside a cycle, where
//! some member is necessarily emitted before another that depends on it.
//! [`cycles`] reports those.

use indexmap::{IndexMap, IndexSet};
use tonal_ast::{Decl, DeclKind, Path, Program};
use tracing::warn;

use crate::graph::Graph;
use crate::passes::Dependencies;

/// Reorder `program` so each declaration follows what it depends on.
pub fn linearize(program: Program, deps: &Dependencies) -> Program {
    let mut types = Vec::new();
    let mut externals = Vec::new();
    let mut functions = Vec::new();
    for decl in program.decls {
        match decl.kind() {
            DeclKind::Type => types.push(decl),
            DeclKind::External => externals.push(decl),
            DeclKind::Function => functions.push(decl),
        }
    }

    let mut decls = pull_in(types, &deps.types);
    decls.extend(externals);
    decls.extend(pull_in(functions, &deps.functions));
    Program { decls }
}

/// Every dependency cycle among types and among functions.
///
/// Each cycle is logged; none is an error.
pub fn cycles(deps: &Dependencies) -> Vec<Vec<Path>> {
    let mut cycles = deps.types.cycles();
    cycles.extend(deps.functions.cycles());
    for cycle in &cycles {
        let members: Vec<String> = cycle.iter().map(Path::to_string).collect();
        warn!(
            members = %members.join(", "),
            "dependency cycle, declaration order within it is unspecified"
        );
    }
    cycles
}

fn pull_in(decls: Vec<Decl>, graph: &Graph<Path>) -> Vec<Decl> {
    let mut partition: IndexMap<Path, Vec<Decl>> = IndexMap::new();
    for decl in decls {
        partition.entry(decl.name().clone()).or_default().push(decl);
    }

    let names: Vec<Path> = partition.keys().cloned().collect();
    let mut visited = IndexSet::new();
    let mut order = Vec::with_capacity(names.len());
    for name in &names {
        visit(name, graph, &partition, &mut visited, &mut order);
    }

    order
        .into_iter()
        .flat_map(|name| partition.shift_remove(name).unwrap_or_default())
        .collect()
}

fn visit<'a>(
    name: &'a Path,
    graph: &'a Graph<Path>,
    partition: &IndexMap<Path, Vec<Decl>>,
    visited: &mut IndexSet<&'a Path>,
    order: &mut Vec<&'a Path>,
) {
    if !visited.insert(name) {
        return;
    }
    for dep in graph.dependencies(name) {
        if partition.contains_key(dep) {
            visit(dep, graph, partition, visited, order);
        }
    }
    order.push(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonal_ast::{ExternDecl, FunctionDecl, Type, TypeDecl};

    fn function(name: &str) -> Decl {
        Decl::Function(FunctionDecl::new(name, vec![], Type::Void, vec![]))
    }

    fn names(program: &Program) -> Vec<String> {
        program.names().iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_dependencies_are_pulled_in_first() {
        let program = Program::new(vec![function("A"), function("B"), function("C")]);
        let mut deps = Dependencies::seeded(&program);
        deps.functions.add_edge(Path::from("A"), Path::from("B"));
        deps.functions.add_edge(Path::from("B"), Path::from("C"));

        let out = linearize(program, &deps);
        assert_eq!(names(&out), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_partitions_are_types_externals_functions() {
        let program = Program::new(vec![
            function("main"),
            Decl::External(ExternDecl::new("now", vec![], Type::Int)),
            Decl::Type(TypeDecl::new("Voice", vec![])),
            function("helper"),
        ]);
        let deps = Dependencies::seeded(&program);

        let out = linearize(program, &deps);
        assert_eq!(names(&out), vec!["Voice", "now", "main", "helper"]);
    }

    #[test]
    fn test_cycle_terminates_and_keeps_every_declaration() {
        let program = Program::new(vec![function("ping"), function("pong"), function("main")]);
        let mut deps = Dependencies::seeded(&program);
        deps.functions.add_edge(Path::from("ping"), Path::from("pong"));
        deps.functions.add_edge(Path::from("pong"), Path::from("ping"));
        deps.functions.add_edge(Path::from("main"), Path::from("ping"));

        let out = linearize(program, &deps);
        assert_eq!(names(&out), vec!["pong", "ping", "main"]);

        let found = cycles(&deps);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 2);
    }

    #[test]
    fn test_dependencies_outside_the_partition_are_ignored() {
        let program = Program::new(vec![
            function("main"),
            Decl::External(ExternDecl::new("now", vec![], Type::Int)),
        ]);
        let mut deps = Dependencies::seeded(&program);
        deps.functions.add_edge(Path::from("main"), Path::from("now"));
        deps.functions.add_edge(Path::from("main"), Path::from("not"));

        let out = linearize(program, &deps);
        assert_eq!(names(&out), vec!["now", "main"]);
    }
}
