//! Cross-crate properties of the back-end: operator dispatch, dependency
//! ordering, strongly connected components and fixed-point termination.

use std::collections::BTreeSet;

use tonal::passes::Graph;
use tonal::{
    eval_expression, normalize, BinaryOp, CompileOptions, Decl, Error, Expr, FunctionDecl, Param,
    Path, PipelineOptions, Program, Stmt, Type, Value, VmError,
};

fn eval(expr: Expr) -> Result<Value, Error> {
    eval_expression(Program::default(), expr, &CompileOptions::default())
}

fn calls(name: &str, callee: Option<&str>) -> Decl {
    let body = match callee {
        Some(callee) => vec![Stmt::ret(Expr::call(callee, vec![], Type::Int))],
        None => vec![Stmt::ret(Expr::int(0))],
    };
    Decl::Function(FunctionDecl::new(name, vec![], Type::Int, body))
}

fn names(program: &Program) -> Vec<String> {
    program.names().into_iter().map(|p| p.to_string()).collect()
}

// =============================================================================
// Operator dispatch
// =============================================================================

const ARITHMETIC: [BinaryOp; 5] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Mod,
];

const RELATIONAL: [BinaryOp; 6] = [
    BinaryOp::Eq,
    BinaryOp::Ne,
    BinaryOp::Lt,
    BinaryOp::Gt,
    BinaryOp::Le,
    BinaryOp::Ge,
];

#[test]
fn test_arithmetic_preserves_operand_tag() {
    for op in ARITHMETIC {
        let int = eval(Expr::binary(op, Expr::int(9), Expr::int(4))).unwrap();
        assert!(matches!(int, Value::Int(_)), "{op:?} on ints gave {int}");

        let real = eval(Expr::binary(op, Expr::real(9.0), Expr::real(4.0))).unwrap();
        assert!(matches!(real, Value::Real(_)), "{op:?} on reals gave {real}");
    }
}

#[test]
fn test_relational_operators_produce_bool() {
    for op in RELATIONAL {
        for (left, right) in [
            (Expr::int(1), Expr::int(2)),
            (Expr::real(1.0), Expr::real(2.0)),
        ] {
            let value = eval(Expr::binary(op, left, right)).unwrap();
            assert!(matches!(value, Value::Bool(_)), "{op:?} gave {value}");
        }
    }
}

#[test]
fn test_mixed_tags_fail_with_mismatch() {
    for op in ARITHMETIC.into_iter().chain(RELATIONAL) {
        let err = eval(Expr::binary(op, Expr::int(1), Expr::real(1.0))).unwrap_err();
        assert!(
            matches!(err, Error::Vm(VmError::ArgumentMismatch { .. })),
            "{op:?} did not reject int/real: {err}"
        );
    }
    let err = eval(Expr::binary(BinaryOp::Add, Expr::bool(true), Expr::bool(true))).unwrap_err();
    assert!(matches!(err, Error::Vm(VmError::ArgumentMismatch { op: "+", .. })));
}

#[test]
fn test_builtin_not_evaluates() {
    let not = Expr::call("not", vec![Expr::bool(false)], Type::Bool);
    assert_eq!(eval(not).unwrap(), Value::Bool(true));
}

// =============================================================================
// Dependency ordering
// =============================================================================

#[test]
fn test_pull_in_order_places_callees_first() {
    // A calls B, B calls C
    let program = Program::new(vec![
        calls("A", Some("B")),
        calls("B", Some("C")),
        calls("C", None),
    ]);

    let report = normalize(program, &PipelineOptions::default());

    assert_eq!(names(&report.program), vec!["C", "B", "A"]);
    assert!(report.cycles.is_empty());
}

#[test]
fn test_mutual_recursion_is_reported_and_runs() {
    // even(n) = if n == 0 then true else odd(n - 1)
    // odd(n)  = if n == 0 then false else even(n - 1)
    let step = |name: &str, base: bool, other: &str| {
        let n = Expr::id("n", Type::Int);
        let body = Expr::if_(
            Expr::binary(BinaryOp::Eq, n.clone(), Expr::int(0)),
            Expr::bool(base),
            Expr::call(
                other,
                vec![Expr::binary(BinaryOp::Sub, n, Expr::int(1))],
                Type::Bool,
            ),
        );
        Decl::Function(FunctionDecl::new(
            name,
            vec![Param::new("n", Type::Int)],
            Type::Bool,
            vec![Stmt::ret(body)],
        ))
    };
    let program = Program::new(vec![step("even", true, "odd"), step("odd", false, "even")]);

    let report = normalize(program.clone(), &PipelineOptions::default());
    assert_eq!(report.cycles.len(), 1);
    let cycle: BTreeSet<String> = report.cycles[0].iter().map(Path::to_string).collect();
    assert_eq!(cycle, BTreeSet::from(["even".to_string(), "odd".to_string()]));

    let call = Expr::call("even", vec![Expr::int(7)], Type::Bool);
    let value = eval_expression(program, call, &CompileOptions::default()).unwrap();
    assert_eq!(value, Value::Bool(false));
}

// =============================================================================
// Strongly connected components
// =============================================================================

#[test]
fn test_three_cycle_and_isolated_vertex() {
    let mut graph = Graph::new();
    graph.add_edge("A", "B");
    graph.add_edge("B", "C");
    graph.add_edge("C", "A");
    graph.add_vertex("D");

    let components: BTreeSet<BTreeSet<&str>> = graph
        .components()
        .into_iter()
        .map(|c| c.into_iter().collect())
        .collect();

    let expected = BTreeSet::from([BTreeSet::from(["A", "B", "C"]), BTreeSet::from(["D"])]);
    assert_eq!(components, expected);
}

// =============================================================================
// Fixed point
// =============================================================================

#[test]
fn test_conditional_argument_stabilizes_within_cap() {
    // f(x) = return g(if x > 0 then x else 0)
    let x = Expr::id("x", Type::Int);
    let arg = Expr::if_(
        Expr::binary(BinaryOp::Gt, x.clone(), Expr::int(0)),
        x.clone(),
        Expr::int(0),
    );
    let f = FunctionDecl::new(
        "f",
        vec![Param::new("x", Type::Int)],
        Type::Int,
        vec![Stmt::ret(Expr::call("g", vec![arg], Type::Int))],
    );
    let g = FunctionDecl::new(
        "g",
        vec![Param::new("x", Type::Int)],
        Type::Int,
        vec![Stmt::ret(x)],
    );
    let program = Program::new(vec![Decl::Function(f), Decl::Function(g)]);

    let report = normalize(program.clone(), &PipelineOptions::default());
    assert!(report.reached_fixed_point);
    assert!(report.iterations <= tonal::passes::DEFAULT_MAX_ITERATIONS);

    // A second run over the normalized program finds nothing to do.
    let again = normalize(report.program.clone(), &PipelineOptions::default());
    assert_eq!(again.iterations, 1);
    assert_eq!(again.program, report.program);
}
