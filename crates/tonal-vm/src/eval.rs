//! Tree-walking evaluator over the lowered instruction form.
//!
//! Operators dispatch on the runtime tags of their operands, never on static
//! types. Any tag combination an operator does not accept is an invariant
//! violation and fails with the matching [`VmError`]; nothing is coerced.
//!
//! # Call protocol
//!
//! 1. Arguments are evaluated left to right.
//! 2. The callee is resolved; externals are rejected.
//! 3. A frame is opened with storage for every local.
//! 4. Arguments are pushed, then popped into the parameter cells.
//! 5. The body runs; a `Return` leaves exactly one value on the stack.
//! 6. That value is popped and the frame is closed.

use tracing::{debug, trace};

use crate::code::{Expr, Instr, Lvalue};
use crate::error::{Result, VmError};
use crate::machine::Machine;
use crate::value::{Object, Value};
use tonal_ast::{BinaryOp, Path, UnaryOp};

/// How a statement sequence finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Control fell off the end of the sequence.
    Continue,
    /// A `Return` ran and its value is on the stack.
    Returned,
}

/// Runs `entry` with already evaluated arguments.
pub fn run(m: &mut dyn Machine, entry: &Path, args: Vec<Value>) -> Result<Value> {
    debug!(entry = %entry, args = args.len(), "evaluating");
    invoke(m, entry, args)
}

/// Evaluates one expression in the active frame.
pub fn eval_expr(m: &mut dyn Machine, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Ref(name) => m.load(name),
        Expr::Unary { op, operand } => {
            let operand = eval_expr(m, operand)?;
            unary(*op, operand)
        }
        Expr::Binary { op, left, right } => {
            let left = eval_expr(m, left)?;
            let right = eval_expr(m, right)?;
            binary(*op, left, right)
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if condition(m, cond)? {
                eval_expr(m, then_branch)
            } else {
                eval_expr(m, else_branch)
            }
        }
        Expr::Object(elems) => {
            let values = elems
                .iter()
                .map(|elem| eval_expr(m, elem))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::object(values))
        }
        Expr::Index { object, index } => {
            let object = eval_expr(m, object)?;
            let index = eval_expr(m, index)?;
            let (obj, i) = indexed(&object, &index)?;
            element(obj, i)
        }
        Expr::Member { object, offset } => {
            let object = eval_expr(m, object)?;
            match &object {
                Value::Object(obj) => element(obj, *offset),
                other => Err(VmError::InvalidMember {
                    offset: *offset,
                    found: other.tag(),
                }),
            }
        }
        Expr::Call { name, args } => call(m, name, args),
    }
}

/// Executes a statement sequence in the active frame.
pub fn eval_stmts(m: &mut dyn Machine, instrs: &[Instr]) -> Result<Flow> {
    for instr in instrs {
        let flow = match instr {
            Instr::Return(value) => {
                let value = eval_expr(m, value)?;
                m.push(value)?;
                Flow::Returned
            }
            Instr::If(cond, then_branch, else_branch) => {
                if condition(m, cond)? {
                    eval_stmts(m, then_branch)?
                } else {
                    eval_stmts(m, else_branch)?
                }
            }
            Instr::While(cond, body) => {
                let mut flow = Flow::Continue;
                while condition(m, cond)? {
                    flow = eval_stmts(m, body)?;
                    if flow == Flow::Returned {
                        break;
                    }
                }
                flow
            }
            Instr::Store(target, value) => {
                let place = place(m, target)?;
                let value = eval_expr(m, value)?;
                store(m, target, place, value)?;
                Flow::Continue
            }
        };
        if flow == Flow::Returned {
            return Ok(Flow::Returned);
        }
    }
    Ok(Flow::Continue)
}

/// Evaluates `args` left to right and calls `name` with them.
pub fn call(m: &mut dyn Machine, name: &Path, args: &[Expr]) -> Result<Value> {
    let values = args
        .iter()
        .map(|arg| eval_expr(m, arg))
        .collect::<Result<Vec<_>>>()?;
    invoke(m, name, values)
}

fn invoke(m: &mut dyn Machine, name: &Path, args: Vec<Value>) -> Result<Value> {
    let function = m.function(name)?;
    if function.params.len() != args.len() {
        return Err(VmError::ArityMismatch {
            expected: function.params.len(),
            found: args.len(),
        });
    }

    m.enter_frame(&function)?;
    trace!(function = %name, depth = m.call_depth(), "call");

    for arg in args {
        m.push(arg)?;
    }
    for param in function.params.iter().rev() {
        let value = m.pop()?;
        m.declare(param, value)?;
    }

    let base = m.stack_depth();
    eval_stmts(m, &function.body)?;
    if m.stack_depth() != base + 1 {
        return Err(VmError::UnexpectedStackDepth {
            expected: base + 1,
            found: m.stack_depth(),
        });
    }
    let result = m.pop()?;

    trace!(function = %name, depth = m.call_depth(), result = %result, "return");
    m.leave_frame()?;
    Ok(result)
}

fn condition(m: &mut dyn Machine, cond: &Expr) -> Result<bool> {
    match eval_expr(m, cond)? {
        Value::Bool(b) => Ok(b),
        other => Err(VmError::InvalidCondition { found: other.tag() }),
    }
}

fn indexed<'v>(object: &'v Value, index: &Value) -> Result<(&'v Object, usize)> {
    match (object, index) {
        (Value::Object(obj), Value::Int(i)) => {
            let len = obj.borrow().len();
            match usize::try_from(*i) {
                Ok(i) if i < len => Ok((obj, i)),
                _ => Err(VmError::IndexOutOfBounds { index: *i, len }),
            }
        }
        _ => Err(VmError::InvalidIndex {
            object: object.tag(),
            index: index.tag(),
        }),
    }
}

fn element(obj: &Object, offset: usize) -> Result<Value> {
    let elems = obj.borrow();
    elems.get(offset).cloned().ok_or(VmError::IndexOutOfBounds {
        index: offset as i64,
        len: elems.len(),
    })
}

fn mismatch(op: &'static str, operands: &[&Value]) -> VmError {
    let found = operands
        .iter()
        .map(|v| v.tag())
        .collect::<Vec<_>>()
        .join(", ");
    VmError::ArgumentMismatch { op, found }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, &operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Real(x)) => Ok(Value::Real(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, _) => Err(mismatch("-", &[&operand])),
        (UnaryOp::Not, _) => Err(mismatch("not", &[&operand])),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use BinaryOp::*;

    let value = match (op, &left, &right) {
        (Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
        (Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
        (Div | Mod, Value::Int(_), Value::Int(0)) => return Err(VmError::DivisionByZero),
        (Div, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(*b)),
        (Mod, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(*b)),

        (Add, Value::Real(a), Value::Real(b)) => Value::Real(a + b),
        (Sub, Value::Real(a), Value::Real(b)) => Value::Real(a - b),
        (Mul, Value::Real(a), Value::Real(b)) => Value::Real(a * b),
        (Div, Value::Real(a), Value::Real(b)) => Value::Real(a / b),
        (Mod, Value::Real(a), Value::Real(b)) => Value::Real(a % b),

        (Eq, Value::Int(a), Value::Int(b)) => Value::Bool(a == b),
        (Ne, Value::Int(a), Value::Int(b)) => Value::Bool(a != b),
        (Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
        (Gt, Value::Int(a), Value::Int(b)) => Value::Bool(a > b),
        (Le, Value::Int(a), Value::Int(b)) => Value::Bool(a <= b),
        (Ge, Value::Int(a), Value::Int(b)) => Value::Bool(a >= b),

        (Eq, Value::Real(a), Value::Real(b)) => Value::Bool(a == b),
        (Ne, Value::Real(a), Value::Real(b)) => Value::Bool(a != b),
        (Lt, Value::Real(a), Value::Real(b)) => Value::Bool(a < b),
        (Gt, Value::Real(a), Value::Real(b)) => Value::Bool(a > b),
        (Le, Value::Real(a), Value::Real(b)) => Value::Bool(a <= b),
        (Ge, Value::Real(a), Value::Real(b)) => Value::Bool(a >= b),

        (Eq, Value::Bool(a), Value::Bool(b)) => Value::Bool(a == b),
        (Ne, Value::Bool(a), Value::Bool(b)) => Value::Bool(a != b),
        (Eq, Value::String(a), Value::String(b)) => Value::Bool(a == b),
        (Ne, Value::String(a), Value::String(b)) => Value::Bool(a != b),

        (And, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a && *b),
        (Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a || *b),

        (BitOr, Value::Int(a), Value::Int(b)) => Value::Int(a | b),
        (BitAnd, Value::Int(a), Value::Int(b)) => Value::Int(a & b),
        (BitXor, Value::Int(a), Value::Int(b)) => Value::Int(a ^ b),
        // shift amounts wrap modulo 64
        (Shl, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_shl(*b as u32)),
        (Shr, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_shr(*b as u32)),

        _ => return Err(mismatch(op.symbol(), &[&left, &right])),
    };
    Ok(value)
}

/// A resolved store target. Index expressions along the path are evaluated
/// before the right-hand side.
enum Place {
    Discard,
    Cell(String),
    Elem(Object, usize),
    Tuple(Vec<Place>),
}

fn place(m: &mut dyn Machine, target: &Lvalue) -> Result<Place> {
    match target {
        Lvalue::Void => Ok(Place::Discard),
        Lvalue::Ref(name) => Ok(Place::Cell(name.clone())),
        Lvalue::Member(inner, offset) => {
            let holder = place(m, inner)?;
            match read(m, inner, &holder)? {
                Value::Object(obj) => Ok(Place::Elem(obj, *offset)),
                other => Err(VmError::InvalidStore {
                    target: target.to_string(),
                    found: other.tag(),
                }),
            }
        }
        Lvalue::Index(inner, index) => {
            let holder = place(m, inner)?;
            let object = read(m, inner, &holder)?;
            let index = eval_expr(m, index)?;
            let (obj, i) = indexed(&object, &index)?;
            Ok(Place::Elem(obj.clone(), i))
        }
        Lvalue::Tuple(elems) => elems
            .iter()
            .map(|elem| place(m, elem))
            .collect::<Result<Vec<_>>>()
            .map(Place::Tuple),
    }
}

fn read(m: &dyn Machine, target: &Lvalue, place: &Place) -> Result<Value> {
    match place {
        Place::Cell(name) => m.load(name),
        Place::Elem(obj, i) => element(obj, *i),
        Place::Discard => Err(VmError::InvalidStore {
            target: target.to_string(),
            found: "void",
        }),
        Place::Tuple(_) => Err(VmError::InvalidStore {
            target: target.to_string(),
            found: "tuple",
        }),
    }
}

fn store(m: &mut dyn Machine, target: &Lvalue, place: Place, value: Value) -> Result<()> {
    match place {
        Place::Discard => Ok(()),
        Place::Cell(name) => m.store(&name, value),
        Place::Elem(obj, i) => {
            let mut elems = obj.borrow_mut();
            let len = elems.len();
            let slot = elems.get_mut(i).ok_or(VmError::IndexOutOfBounds {
                index: i as i64,
                len,
            })?;
            *slot = value;
            Ok(())
        }
        Place::Tuple(places) => {
            let values = match &value {
                Value::Object(obj) => obj.borrow().clone(),
                other => {
                    return Err(VmError::InvalidStore {
                        target: target.to_string(),
                        found: other.tag(),
                    })
                }
            };
            if values.len() != places.len() {
                return Err(VmError::ArityMismatch {
                    expected: places.len(),
                    found: values.len(),
                });
            }
            for (place, value) in places.into_iter().zip(values) {
                store(m, target, place, value)?;
            }
            Ok(())
        }
    }
}
