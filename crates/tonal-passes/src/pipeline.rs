//! Normalization pipeline driver.
//!
//! ```text
//! program ─→ [builtin → replacements → hoist → tuples]* ─→ dependencies ─→ linearize
//!              └─ repeated until no pass asks again, at most max_iterations
//! ```
//!
//! Reaching the iteration cap is not an error: the last program is returned
//! as is and [`NormalizeReport::reached_fixed_point`] is false. Every program
//! the passes can normalize reaches its fixed point well within the cap.

use tonal_ast::mapper::Mapper;
use tonal_ast::{Path, Program, TypeTable};
use tracing::{debug, instrument, warn};

use crate::linearize::{cycles, linearize};
use crate::options::PipelineOptions;
use crate::passes::{
    collect_dependencies, Builtin, ConditionalHoist, Dependencies, PassState, SimpleReplacements,
    TupleElimination,
};

/// Outcome of [`normalize`].
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    /// Normalized, dependency-ordered program
    pub program: Program,
    /// Fixed-point iterations run
    pub iterations: usize,
    /// Whether the last iteration left the program unchanged
    pub reached_fixed_point: bool,
    /// Dependency graphs of the normalized program
    pub dependencies: Dependencies,
    /// Dependency cycles, each emitted in unspecified internal order
    pub cycles: Vec<Vec<Path>>,
}

/// Run the passes to a fixed point, then linearize.
#[instrument(skip_all, fields(decls = program.decls.len()))]
pub fn normalize(program: Program, options: &PipelineOptions) -> NormalizeReport {
    let (program, iterations, reached_fixed_point) = fixed_point(program, options);
    if !reached_fixed_point {
        warn!(
            iterations,
            "normalization hit the iteration cap before reaching a fixed point"
        );
    }

    let types = TypeTable::from_program(&program);
    let (program, dependencies) = collect_dependencies(program, &types);
    let program = linearize(program, &dependencies);
    let cycles = cycles(&dependencies);

    debug!(
        iterations,
        decls = program.decls.len(),
        cycles = cycles.len(),
        "normalization complete"
    );

    NormalizeReport {
        program,
        iterations,
        reached_fixed_point,
        dependencies,
        cycles,
    }
}

/// Apply the rewriting passes until none requests another iteration.
///
/// Returns the program, the number of iterations run and whether a fixed
/// point was reached.
pub fn fixed_point(mut program: Program, options: &PipelineOptions) -> (Program, usize, bool) {
    let replacements = SimpleReplacements::new(&options.replacements);
    let mapper = Mapper::<PassState>::new()
        .with(&Builtin)
        .with(&replacements)
        .with(&ConditionalHoist)
        .with(&TupleElimination);

    let mut state = PassState::new();
    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        let types = TypeTable::from_program(&program);
        program = mapper.map_program(&types, &mut state, program);
        if !state.take_repeat() {
            return (program, iterations, true);
        }
        debug!(iteration = iterations, "re-applying passes");
    }
    (program, iterations, false)
}
