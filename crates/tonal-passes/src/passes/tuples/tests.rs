use super::*;
use tonal_ast::mapper::Mapper;
use tonal_ast::{BinaryOp, FunctionDecl, Path, Program, TypeTable};

fn int(name: &str) -> Lhs {
    Lhs::id(name, Type::Int)
}

fn var(name: &str) -> Expr {
    Expr::id(name, Type::Int)
}

fn pair() -> Type {
    Type::Tuple(vec![Type::Int, Type::Int])
}

fn divmod() -> Decl {
    Decl::Function(FunctionDecl::new(
        "divmod",
        vec![Param::new("a", Type::Int), Param::new("b", Type::Int)],
        pair(),
        vec![Stmt::ret(Expr::tuple(vec![
            Expr::binary(BinaryOp::Div, var("a"), var("b")),
            Expr::binary(BinaryOp::Mod, var("a"), var("b")),
        ]))],
    ))
}

fn run(decls: Vec<Decl>) -> (Program, bool) {
    let program = Program::new(decls);
    let types = TypeTable::from_program(&program);
    let mut state = PassState::new();
    let out = Mapper::<PassState>::new()
        .with(&TupleElimination)
        .map_program(&types, &mut state, program);
    (out, state.take_repeat())
}

fn run_body(body: Vec<Stmt>) -> Vec<Stmt> {
    let f = Decl::Function(FunctionDecl::new("f", vec![], Type::Void, body));
    let (out, _) = run(vec![f]);
    body_of(&out, "f")
}

fn body_of(program: &Program, name: &str) -> Vec<Stmt> {
    program
        .function(&Path::from(name))
        .map(|f| f.body.clone())
        .unwrap()
}

#[test]
fn test_disjoint_assignment_is_componentwise() {
    let body = run_body(vec![Stmt::bind(
        Lhs::tuple(vec![int("a"), int("b")]),
        Expr::tuple(vec![var("x"), var("y")]),
    )]);

    assert_eq!(
        body,
        vec![
            Stmt::bind(int("a"), var("x")),
            Stmt::bind(int("b"), var("y")),
        ]
    );
}

#[test]
fn test_overlapping_assignment_goes_through_temporaries() {
    let body = run_body(vec![Stmt::bind(
        Lhs::tuple(vec![int("a"), int("b")]),
        Expr::tuple(vec![var("b"), var("a")]),
    )]);

    assert_eq!(
        body,
        vec![
            Stmt::decl(int("_tuple_temp_0"), Some(var("b"))),
            Stmt::decl(int("_tuple_temp_1"), Some(var("a"))),
            Stmt::bind(int("a"), var("_tuple_temp_0")),
            Stmt::bind(int("b"), var("_tuple_temp_1")),
        ]
    );
}

#[test]
fn test_tuple_declaration_splits_and_drops_wildcards() {
    let pattern = Lhs::tuple(vec![int("a"), Lhs::wild(Type::Int), int("c")]);
    let body = run_body(vec![Stmt::decl(pattern, None)]);

    assert_eq!(
        body,
        vec![Stmt::decl(int("a"), None), Stmt::decl(int("c"), None)]
    );
}

#[test]
fn test_tuple_declaration_with_literal() {
    let pattern = Lhs::tuple(vec![int("a"), int("b")]);
    let body = run_body(vec![Stmt::decl(
        pattern,
        Some(Expr::tuple(vec![Expr::int(1), Expr::int(2)])),
    )]);

    assert_eq!(
        body,
        vec![
            Stmt::decl(int("a"), Some(Expr::int(1))),
            Stmt::decl(int("b"), Some(Expr::int(2))),
        ]
    );
}

#[test]
fn test_wildcard_declaration_keeps_initializer_effects() {
    let call = Expr::call("tick", vec![], Type::Int);
    let body = run_body(vec![Stmt::decl(Lhs::wild(Type::Int), Some(call.clone()))]);

    assert_eq!(body, vec![Stmt::bind(Lhs::wild(Type::Int), call)]);
}

#[test]
fn test_tuple_function_gets_context_type_and_parameter() {
    let (out, repeat) = run(vec![divmod()]);
    assert!(repeat);

    let names: Vec<String> = out.names().iter().map(|p| p.to_string()).collect();
    assert_eq!(names, vec!["divmod_ctx", "divmod"]);

    let Decl::Type(ctx) = &out.decls[0] else {
        panic!("expected context type");
    };
    let members: Vec<&str> = ctx.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(members, vec!["_ret_0", "_ret_1"]);

    let f = out.function(&Path::from("divmod")).unwrap();
    assert_eq!(f.ret, Type::Void);
    assert_eq!(f.params[0].name, "_ctx");
    assert_eq!(f.params[0].ty, Type::named("divmod_ctx"));
}

#[test]
fn test_tuple_return_stores_into_context() {
    let (out, _) = run(vec![divmod()]);
    let body = body_of(&out, "divmod");

    let ctx = || Lhs::id("_ctx", Type::named("divmod_ctx"));
    assert_eq!(
        body,
        vec![
            Stmt::bind(
                Lhs::member(ctx(), "_ret_0", Type::Int),
                Expr::binary(BinaryOp::Div, var("a"), var("b")),
            ),
            Stmt::bind(
                Lhs::member(ctx(), "_ret_1", Type::Int),
                Expr::binary(BinaryOp::Mod, var("a"), var("b")),
            ),
            Stmt::ret(Expr::unit()),
        ]
    );
}

#[test]
fn test_tuple_call_reads_results_from_context() {
    let call = Expr::call("divmod", vec![Expr::int(7), Expr::int(2)], pair());
    let caller = Decl::Function(FunctionDecl::new(
        "main",
        vec![],
        Type::Void,
        vec![Stmt::decl(Lhs::tuple(vec![int("q"), int("r")]), Some(call))],
    ));
    let (out, _) = run(vec![divmod(), caller]);
    let body = body_of(&out, "main");

    let ctx_ty = Type::named("divmod_ctx");
    let ctx = || Expr::id("_call_ctx_0", ctx_ty.clone());
    assert_eq!(
        body,
        vec![
            Stmt::decl(int("q"), None),
            Stmt::decl(int("r"), None),
            Stmt::decl(Lhs::id("_call_ctx_0", ctx_ty.clone()), None),
            Stmt::bind(
                Lhs::wild(Type::Void),
                Expr::call(
                    "divmod",
                    vec![ctx(), Expr::int(7), Expr::int(2)],
                    Type::Void
                ),
            ),
            Stmt::bind(int("q"), Expr::member(ctx(), "_ret_0", Type::Int)),
            Stmt::bind(int("r"), Expr::member(ctx(), "_ret_1", Type::Int)),
        ]
    );
}

#[test]
fn test_returning_a_tuple_call_forwards_results() {
    let call = Expr::call("divmod", vec![var("x"), Expr::int(2)], pair());
    let wrapper = Decl::Function(FunctionDecl::new(
        "wrap",
        vec![Param::new("x", Type::Int)],
        pair(),
        vec![Stmt::ret(call)],
    ));
    let (out, _) = run(vec![divmod(), wrapper]);
    let body = body_of(&out, "wrap");

    let stores: Vec<&Stmt> = body
        .iter()
        .filter(|s| matches!(s, Stmt::Bind { lhs, .. } if matches!(lhs.kind, LhsKind::Member { .. })))
        .collect();
    assert_eq!(stores.len(), 2);
    assert_eq!(body.last(), Some(&Stmt::ret(Expr::unit())));
    assert!(body.iter().any(|s| matches!(
        s,
        Stmt::Bind { rhs, .. } if matches!(&rhs.kind, ExprKind::Call { path, .. } if path == &Path::from("divmod"))
    )));
}

#[test]
fn test_external_tuple_calls_are_left_alone() {
    let ext = Decl::External(tonal_ast::ExternDecl::new("pan", vec![], pair()));
    let call = Expr::call("pan", vec![], pair());
    let stmt = Stmt::bind(Lhs::id("lr", pair()), call);
    let caller = Decl::Function(FunctionDecl::new(
        "main",
        vec![],
        Type::Void,
        vec![stmt.clone()],
    ));
    let (out, repeat) = run(vec![ext, caller]);

    assert_eq!(body_of(&out, "main"), vec![stmt]);
    assert!(!repeat);
}
