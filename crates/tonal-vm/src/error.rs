//! Interpreter and lowering errors.
//!
//! Every [`VmError`] is an invariant violation: a program that passed type
//! inference and normalization never produces one. They surface as `Err`
//! values so the caller can report the defect, but nothing inside the VM
//! recovers from them.

use tonal_ast::{Path, Type};

/// Interpreter invariant violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    /// An operator received operands whose runtime tags it does not accept.
    #[error("argument mismatch in `{op}`: found {found}")]
    ArgumentMismatch {
        /// Operator symbol
        op: &'static str,
        /// Tags of the operands, in order
        found: String,
    },

    /// A condition did not evaluate to a bool.
    #[error("invalid condition: expected bool, found {found}")]
    InvalidCondition {
        /// Tag of the condition value
        found: &'static str,
    },

    /// A store target does not hold an object where one is required.
    #[error("invalid store: {target} holds {found}")]
    InvalidStore {
        /// Rendering of the store target
        target: String,
        /// Tag of the value found at the target
        found: &'static str,
    },

    /// Indexing something other than an object, or with something other than an int.
    #[error("invalid index: {object}[{index}]")]
    InvalidIndex {
        /// Tag of the indexed value
        object: &'static str,
        /// Tag of the index value
        index: &'static str,
    },

    /// An index or member offset outside the object.
    #[error("index {index} out of bounds for object of length {len}")]
    IndexOutOfBounds {
        /// Requested position
        index: i64,
        /// Object length
        len: usize,
    },

    /// Member access on something other than an object.
    #[error("invalid member access: offset {offset} on {found}")]
    InvalidMember {
        /// Resolved member offset
        offset: usize,
        /// Tag of the accessed value
        found: &'static str,
    },

    /// External functions are bound by the emitting backends, never interpreted.
    #[error("external function `{name}` cannot be called by the interpreter")]
    ExternalCall {
        /// Callee
        name: Path,
        /// Symbol the backend would bind the call to
        link_name: Option<String>,
    },

    /// No function of this name was lowered.
    #[error("unknown function `{name}`")]
    UnknownFunction {
        /// Callee
        name: Path,
    },

    /// A variable with no storage in the active frame.
    #[error("unknown reference `{name}`")]
    UnknownReference {
        /// Variable name
        name: String,
    },

    /// Argument count or destructuring shape does not match.
    #[error("arity mismatch: expected {expected}, found {found}")]
    ArityMismatch {
        /// Required count
        expected: usize,
        /// Provided count
        found: usize,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Pop from an empty value stack.
    #[error("stack underflow: tried to pop from empty stack")]
    StackUnderflow,

    /// A call left the value stack at the wrong depth.
    #[error("unexpected stack depth: expected {expected}, found {found}")]
    UnexpectedStackDepth {
        /// Depth the call protocol requires
        expected: usize,
        /// Actual depth
        found: usize,
    },

    /// Call nesting exceeded [`crate::MachineConfig::max_call_depth`].
    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// A frame operation with no active frame.
    #[error("no active frame")]
    NoFrame,
}

/// Lowering failure: the program still contains a form the VM cannot run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LowerError {
    /// A struct type with no declaration.
    #[error("unknown struct type `{name}`")]
    UnknownStruct { name: Path },

    /// A member the struct does not declare.
    #[error("struct `{ty}` has no member `{member}`")]
    UnknownMember { ty: Path, member: String },

    /// Member access on a value whose static type is not a struct.
    #[error("member `{member}` accessed on non-struct type `{ty}`")]
    NotAStruct { member: String, ty: Type },

    /// A struct that contains itself by value has no finite zero value.
    #[error("struct `{name}` contains itself")]
    RecursiveStruct { name: Path },

    /// A member default that does not evaluate without a program.
    #[error("default of `{ty}.{member}` is not constant: {reason}")]
    NonConstantDefault {
        ty: Path,
        member: String,
        reason: VmError,
    },

    /// Two declarations of one local disagree on its type.
    #[error("local `{name}` in `{function}` declared as both `{first}` and `{second}`")]
    ConflictingLocal {
        function: Path,
        name: String,
        first: Type,
        second: Type,
    },

    /// A tuple-returning call survived normalization.
    #[error("call to `{callee}` in `{function}` still returns a tuple")]
    TupleCall { callee: Path, function: Path },
}

pub type Result<T, E = VmError> = std::result::Result<T, E>;
