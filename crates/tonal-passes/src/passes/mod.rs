//! The normalization passes and the state they share.
//!
//! | Pass | Handlers | Effect |
//! |------|----------|--------|
//! | [`Builtin`] | expr | `not(x)` to `x == false`, `size(a)` to a literal |
//! | [`SimpleReplacements`] | expr | retarget calls through a [`ReplacementTable`] |
//! | [`ConditionalHoist`] | expr, stmt | conditional values into `if` statements |
//! | [`TupleElimination`] | stmt, decl | tuples into scalars and context members |
//! | [`DependencyCollection`] | expr, decl | declaration dependency edges |
//!
//! All passes are composed through [`tonal_ast::mapper::Mapper`] over one
//! [`PassState`].

mod builtin;
mod deps;
mod hoist;
mod replace;
mod tuples;

pub use builtin::Builtin;
pub use deps::{collect as collect_dependencies, Dependencies, DependencyCollection, DependencyEdges};
pub use hoist::ConditionalHoist;
pub use replace::{Replacement, ReplacementTable, SimpleReplacements};
pub use tuples::TupleElimination;

use indexmap::IndexMap;
use tonal_ast::{Path, Stmt};
use tracing::trace;

/// Prefix of temporaries introduced for hoisted conditional values.
pub const IF_TEMP: &str = "_if_temp_";
/// Prefix of temporaries used for simultaneous tuple assignment.
pub const TUPLE_TEMP: &str = "_tuple_temp_";
/// Prefix of the per-call-site context locals of tuple-returning calls.
pub const CALL_CTX: &str = "_call_ctx_";
/// Name of the context parameter of a tuple-returning function.
pub const CTX_PARAM: &str = "_ctx";
/// Prefix of the result members of a context type.
pub const RET_MEMBER: &str = "_ret_";
/// Suffix that names the context type of a tuple-returning function.
pub const CTX_SUFFIX: &str = "_ctx";

/// Name of result member `i` of a context type.
pub fn ret_member(i: usize) -> String {
    format!("{RET_MEMBER}{i}")
}

/// State threaded through every pass of a pipeline run.
///
/// Everything except the repeat flag lives for the whole run, so
/// temporary counters keep increasing across fixed-point iterations and
/// fresh names never collide with ones introduced earlier.
#[derive(Debug, Default)]
pub struct PassState {
    repeat: bool,
    counters: IndexMap<(Path, &'static str), usize>,
    pending: Vec<Stmt>,
    /// Dependency edges, filled by [`DependencyCollection`]
    pub deps: Dependencies,
}

impl PassState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver for another full iteration.
    pub fn request_repeat(&mut self, pass: &'static str) {
        if !self.repeat {
            trace!(pass, "re-application requested");
        }
        self.repeat = true;
    }

    pub fn repeat_requested(&self) -> bool {
        self.repeat
    }

    /// Read and clear the repeat flag.
    pub fn take_repeat(&mut self) -> bool {
        std::mem::take(&mut self.repeat)
    }

    /// A fresh `{prefix}{n}` name, sequential per enclosing declaration.
    pub fn fresh(&mut self, scope: &Path, prefix: &'static str) -> String {
        let counter = self.counters.entry((scope.clone(), prefix)).or_insert(0);
        let name = format!("{prefix}{counter}");
        *counter += 1;
        name
    }

    /// Queue a statement to be emitted before the statement being rewritten.
    pub fn defer(&mut self, stmt: Stmt) {
        self.pending.push(stmt);
    }

    /// Drain the queued statements.
    pub fn take_pending(&mut self) -> Vec<Stmt> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_are_per_scope_and_prefix() {
        let mut state = PassState::new();
        let f = Path::from("f");
        let g = Path::from("g");

        assert_eq!(state.fresh(&f, IF_TEMP), "_if_temp_0");
        assert_eq!(state.fresh(&f, IF_TEMP), "_if_temp_1");
        assert_eq!(state.fresh(&g, IF_TEMP), "_if_temp_0");
        assert_eq!(state.fresh(&f, TUPLE_TEMP), "_tuple_temp_0");
    }

    #[test]
    fn test_take_repeat_resets() {
        let mut state = PassState::new();
        assert!(!state.take_repeat());

        state.request_repeat("test");
        assert!(state.repeat_requested());
        assert!(state.take_repeat());
        assert!(!state.repeat_requested());
    }
}
