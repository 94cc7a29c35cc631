//! Runtime values.
//!
//! One tagged union for everything the interpreter handles. Arrays, tuples
//! and struct instances are all [`Value::Object`]: an ordered element list
//! where a struct's member order is its index order. The distinction between
//! them exists only in the static types.
//!
//! Objects are shared mutable cells. Copying a `Value` copies the handle, so
//! a store into an element through one holder is seen by every other; this
//! is how a callee writes results into a caller's context object. Use
//! [`Value::deep_copy`] for an independent value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable element storage of an object.
pub type Object = Rc<RefCell<Vec<Value>>>;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Int(i64),
    Real(f64),
    Bool(bool),
    String(String),
    Object(Object),
}

impl Value {
    /// A fresh object holding `elems`.
    pub fn object(elems: Vec<Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(elems)))
    }

    /// Short name of the variant, used in error reports.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Snapshot of an object's elements.
    pub fn elems(&self) -> Option<Vec<Value>> {
        self.as_object().map(|obj| obj.borrow().clone())
    }

    /// A copy sharing no object storage with `self`.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Object(obj) => Value::object(obj.borrow().iter().map(Value::deep_copy).collect()),
            other => other.clone(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "()"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Object(obj) => {
                write!(f, "{{")?;
                for (i, elem) in obj.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
