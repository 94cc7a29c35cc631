//! High-level compile and interpret API.

use tracing::{debug, instrument};

use crate::config::CompileOptions;
use crate::error::Result;
use tonal_ast::{Decl, Expr, FunctionDecl, Param, Path, Program, Stmt, Type, TypeTable};
use tonal_passes::passes::{CTX_PARAM, CTX_SUFFIX};
use tonal_passes::{normalize, NormalizeReport};
use tonal_vm::{lower_program, run, zero_value, FunctionTable, MachineConfig, MachineState, Value};

/// Name of the synthetic function [`eval_expression`] wraps its expression in.
pub const EVAL_ENTRY: &str = "_eval_";

/// A normalized, ordered and lowered program.
#[derive(Debug)]
pub struct Compiled {
    /// Normalization result; `report.program` is what the text backends consume
    pub report: NormalizeReport,
    /// Type table of the normalized program
    pub types: TypeTable,
    pub functions: FunctionTable,
}

impl Compiled {
    /// Runs `entry` on a fresh machine.
    ///
    /// An entry point that returned a tuple before normalization takes its
    /// context value as a hidden first argument. It is allocated here and
    /// returned as the result, so the caller sees the tuple as an object of
    /// its components.
    pub fn run(&self, entry: &Path, mut args: Vec<Value>, config: &MachineConfig) -> Result<Value> {
        let mut machine = MachineState::new(self.functions.clone(), config.clone());
        match self.context_type(entry) {
            Some(ctx_ty) => {
                let ctx = zero_value(ctx_ty, &self.types)?;
                args.insert(0, ctx.clone());
                run(&mut machine, entry, args)?;
                Ok(ctx)
            }
            None => Ok(run(&mut machine, entry, args)?),
        }
    }

    fn context_type(&self, entry: &Path) -> Option<&Type> {
        let f = self.report.program.function(entry)?;
        let first = f.params.first()?;
        let ctx = entry.with_suffix(CTX_SUFFIX);
        (first.name == CTX_PARAM && first.ty.struct_name() == Some(&ctx)).then_some(&first.ty)
    }
}

/// Normalizes, orders and lowers `program`.
///
/// # Errors
///
/// Returns [`crate::Error::Lower`] if the normalized program still contains
/// a form the interpreter cannot express.
#[instrument(skip_all, fields(decls = program.decls.len()))]
pub fn compile(program: Program, options: &CompileOptions) -> Result<Compiled> {
    let report = normalize(program, &options.pipeline);
    let types = TypeTable::from_program(&report.program);
    let functions = lower_program(&report.program, &types)?;
    debug!(
        functions = functions.len(),
        iterations = report.iterations,
        "compiled"
    );
    Ok(Compiled {
        report,
        types,
        functions,
    })
}

/// Compiles `program` and calls `entry` with `args`.
pub fn interpret(
    program: Program,
    entry: &Path,
    args: Vec<Value>,
    options: &CompileOptions,
) -> Result<Value> {
    compile(program, options)?.run(entry, args, &options.machine)
}

/// Evaluates a top-level expression against the declarations of `program`.
///
/// The expression becomes the body of a zero-argument function
/// [`EVAL_ENTRY`], which is linked with the program, normalized and run.
pub fn eval_expression(program: Program, expr: Expr, options: &CompileOptions) -> Result<Value> {
    eval_in(program, expr, None, options)
}

/// Like [`eval_expression`], with `main` bound as the parameter of
/// [`EVAL_ENTRY`] so the expression can read the populated main argument.
pub fn eval_expression_with(
    program: Program,
    expr: Expr,
    main: (Param, Value),
    options: &CompileOptions,
) -> Result<Value> {
    eval_in(program, expr, Some(main), options)
}

fn eval_in(
    mut program: Program,
    expr: Expr,
    main: Option<(Param, Value)>,
    options: &CompileOptions,
) -> Result<Value> {
    let entry = Path::from(EVAL_ENTRY);
    let (params, args) = main.map_or_else(
        || (vec![], vec![]),
        |(param, value)| (vec![param], vec![value]),
    );
    let wrapper = FunctionDecl::new(entry.clone(), params, expr.ty.clone(), vec![Stmt::ret(expr)]);

    program.decls.push(Decl::Function(wrapper));
    interpret(program, &entry, args, options)
}
