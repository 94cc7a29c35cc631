//! Lowered instruction form.
//!
//! The evaluator runs this, not the AST: member access is an integer offset,
//! arrays, tuples and structs are all object construction, and a body is a
//! flat list of four instruction kinds.

use std::rc::Rc;

use indexmap::IndexMap;
use tonal_ast::{BinaryOp, Path, UnaryOp};

use crate::value::Value;

/// A lowered expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal
    Lit(Value),
    /// Read of a named cell in the active frame
    Ref(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Conditional; only the taken branch is evaluated
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Object construction, elements evaluated in order
    Object(Vec<Expr>),
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// Element at a statically resolved offset
    Member {
        object: Box<Expr>,
        offset: usize,
    },
    Call {
        name: Path,
        args: Vec<Expr>,
    },
}

/// A lowered store target.
#[derive(Debug, Clone, PartialEq)]
pub enum Lvalue {
    /// Discard
    Void,
    /// A named cell
    Ref(String),
    /// Element at an offset of the object held by the inner target
    Member(Box<Lvalue>, usize),
    /// Element at a runtime index of the object held by the inner target
    Index(Box<Lvalue>, Box<Expr>),
    /// Destructuring target, stored pairwise
    Tuple(Vec<Lvalue>),
}

impl std::fmt::Display for Lvalue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lvalue::Void => write!(f, "_"),
            Lvalue::Ref(name) => write!(f, "{name}"),
            Lvalue::Member(inner, offset) => write!(f, "{inner}.{offset}"),
            Lvalue::Index(inner, _) => write!(f, "{inner}[..]"),
            Lvalue::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A lowered instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Return(Expr),
    If(Expr, Vec<Instr>, Vec<Instr>),
    While(Expr, Vec<Instr>),
    Store(Lvalue, Expr),
}

/// A lowered function body with its storage layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Path,
    /// Parameter names, in order
    pub params: Vec<String>,
    /// Every declared local with the value it starts from in each frame
    pub locals: Vec<(String, Value)>,
    pub body: Vec<Instr>,
}

/// What a function name resolves to.
#[derive(Debug, Clone)]
pub enum FunctionEntry {
    Defined(Rc<Function>),
    /// Bound by the emitting backend; the interpreter cannot call it
    External { link_name: Option<String> },
}

/// Lowered functions by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: IndexMap<Path, FunctionEntry>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, function: Function) {
        let name = function.name.clone();
        self.entries.insert(name, FunctionEntry::Defined(Rc::new(function)));
    }

    pub fn declare_external(&mut self, name: Path, link_name: Option<String>) {
        self.entries.insert(name, FunctionEntry::External { link_name });
    }

    pub fn get(&self, name: &Path) -> Option<&FunctionEntry> {
        self.entries.get(name)
    }

    /// The defined function `name`, if there is one.
    pub fn function(&self, name: &Path) -> Option<&Function> {
        match self.entries.get(name)? {
            FunctionEntry::Defined(f) => Some(f),
            FunctionEntry::External { .. } => None,
        }
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
