//! Lowering of a normalized program into the instruction form.
//!
//! # Design Principles
//!
//! 1. **Offsets, not names** - member access is resolved once against the
//!    declaring struct's member order
//! 2. **Every local has storage** - each declared name gets a zero value
//!    derived from its type, allocated when the frame opens
//! 3. **No silent fallbacks** - forms the evaluator cannot run are
//!    [`LowerError`]s, never dropped
//!
//! A declaration without initializer emits no instruction; its storage
//! already exists. Void functions get a trailing `Return(())` so every call
//! yields exactly one value.

use indexmap::IndexMap;
use tracing::trace;

use crate::code::{Expr, Function, FunctionTable, Instr, Lvalue};
use crate::error::LowerError;
use crate::eval::eval_expr;
use crate::machine::{MachineConfig, MachineState};
use crate::value::Value;
use tonal_ast::ast::walk_stmts;
use tonal_ast::{
    Decl, Expr as AstExpr, ExprKind, FunctionDecl, Lhs, LhsKind, Path, Program, Stmt, Type,
    TypeTable,
};

type Result<T> = std::result::Result<T, LowerError>;

/// Lowers every function and external of `program`.
pub fn lower_program(program: &Program, types: &TypeTable) -> Result<FunctionTable> {
    let mut table = FunctionTable::new();
    for decl in &program.decls {
        match decl {
            Decl::Type(_) => {}
            Decl::Function(f) => table.define(lower_function(f, types)?),
            Decl::External(e) => table.declare_external(e.name.clone(), e.link_name.clone()),
        }
    }
    trace!(entries = table.len(), "lowered program");
    Ok(table)
}

/// Lowers one function.
pub fn lower_function(f: &FunctionDecl, types: &TypeTable) -> Result<Function> {
    let params: Vec<String> = f.params.iter().map(|p| p.name.clone()).collect();

    let mut declared: IndexMap<String, Type> = IndexMap::new();
    let mut conflict = None;
    walk_stmts(&f.body, &mut |stmt| {
        if let Stmt::Decl { lhs, .. } = stmt {
            if conflict.is_none() {
                conflict = declared_names(lhs, &mut declared).err();
            }
        }
    });
    if let Some((name, first, second)) = conflict {
        return Err(LowerError::ConflictingLocal {
            function: f.name.clone(),
            name,
            first,
            second,
        });
    }
    let locals = declared
        .into_iter()
        .filter(|(name, _)| !params.contains(name))
        .map(|(name, ty)| Ok((name, zero_value(&ty, types)?)))
        .collect::<Result<Vec<_>>>()?;

    let lowering = Lowering {
        types,
        function: &f.name,
    };
    let mut body = lowering.stmts(&f.body)?;
    if f.ret.is_void() {
        body.push(Instr::Return(Expr::Lit(Value::Void)));
    }

    Ok(Function {
        name: f.name.clone(),
        params,
        locals,
        body,
    })
}

/// Collects the names `lhs` declares. One cell backs every declaration of a
/// name, so a redeclaration must agree on the type.
fn declared_names(
    lhs: &Lhs,
    out: &mut IndexMap<String, Type>,
) -> std::result::Result<(), (String, Type, Type)> {
    match &lhs.kind {
        LhsKind::Id(name) => match out.get(name) {
            Some(first) if *first != lhs.ty => {
                return Err((name.clone(), first.clone(), lhs.ty.clone()));
            }
            Some(_) => {}
            None => {
                out.insert(name.clone(), lhs.ty.clone());
            }
        },
        LhsKind::Tuple(elems) => {
            for elem in elems {
                declared_names(elem, out)?;
            }
        }
        LhsKind::Wild | LhsKind::Member { .. } | LhsKind::Index { .. } => {}
    }
    Ok(())
}

/// The value a cell of type `ty` holds before its first store.
///
/// Struct members start from their declared default, evaluated here, or
/// from the zero value of their type when they declare none.
///
/// # Errors
///
/// [`LowerError::NonConstantDefault`] when a default refers to a variable
/// or calls a function.
pub fn zero_value(ty: &Type, types: &TypeTable) -> Result<Value> {
    zero_value_in(ty, types, &mut Vec::new())
}

fn zero_value_in(ty: &Type, types: &TypeTable, open: &mut Vec<Path>) -> Result<Value> {
    let value = match ty {
        Type::Void => Value::Void,
        Type::Int => Value::Int(0),
        Type::Real | Type::Fix16 => Value::Real(0.0),
        Type::Bool => Value::Bool(false),
        Type::String => Value::String(String::new()),
        Type::Array { elem, size } => {
            let zero = zero_value_in(elem, types, open)?;
            Value::object((0..*size).map(|_| zero.deep_copy()).collect())
        }
        Type::Tuple(elems) => Value::object(
            elems
                .iter()
                .map(|elem| zero_value_in(elem, types, open))
                .collect::<Result<Vec<_>>>()?,
        ),
        Type::Struct(name) => {
            if open.contains(name) {
                return Err(LowerError::RecursiveStruct { name: name.clone() });
            }
            let members = types
                .members(name)
                .ok_or_else(|| LowerError::UnknownStruct { name: name.clone() })?;
            open.push(name.clone());
            let mut elems = Vec::with_capacity(members.len());
            for member in members {
                let value = match &member.default {
                    Some(default) => member_default(name, &member.name, default, types)?,
                    None => zero_value_in(&member.ty, types, open)?,
                };
                elems.push(value);
            }
            open.pop();
            Value::object(elems)
        }
    };
    Ok(value)
}

/// Evaluates a member default on a machine with no functions and no frame,
/// so only constant expressions succeed.
fn member_default(ty: &Path, member: &str, default: &AstExpr, types: &TypeTable) -> Result<Value> {
    let lowered = Lowering {
        types,
        function: ty,
    }
    .expr(default)?;
    let mut machine = MachineState::new(FunctionTable::new(), MachineConfig::default());
    eval_expr(&mut machine, &lowered).map_err(|reason| LowerError::NonConstantDefault {
        ty: ty.clone(),
        member: member.to_string(),
        reason,
    })
}

struct Lowering<'a> {
    types: &'a TypeTable,
    function: &'a Path,
}

impl Lowering<'_> {
    fn stmts(&self, stmts: &[Stmt]) -> Result<Vec<Instr>> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            match stmt {
                Stmt::Decl { rhs: None, .. } => {}
                Stmt::Decl {
                    lhs, rhs: Some(rhs), ..
                }
                | Stmt::Bind { lhs, rhs, .. } => {
                    out.push(Instr::Store(self.lhs(lhs)?, self.expr(rhs)?));
                }
                Stmt::Return { value, .. } => out.push(Instr::Return(self.expr(value)?)),
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                    ..
                } => out.push(Instr::If(
                    self.expr(cond)?,
                    self.stmts(then_branch)?,
                    self.stmts(else_branch)?,
                )),
                Stmt::While { cond, body, .. } => {
                    out.push(Instr::While(self.expr(cond)?, self.stmts(body)?));
                }
            }
        }
        Ok(out)
    }

    fn expr(&self, expr: &AstExpr) -> Result<Expr> {
        let lowered = match &expr.kind {
            ExprKind::Unit => Expr::Lit(Value::Void),
            ExprKind::Bool(b) => Expr::Lit(Value::Bool(*b)),
            ExprKind::Int(n) => Expr::Lit(Value::Int(*n)),
            ExprKind::Real(x) => Expr::Lit(Value::Real(*x)),
            ExprKind::String(s) => Expr::Lit(Value::String(s.clone())),
            ExprKind::Id(name) => Expr::Ref(name.clone()),
            ExprKind::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: Box::new(self.expr(operand)?),
            },
            ExprKind::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: Box::new(self.expr(left)?),
                right: Box::new(self.expr(right)?),
            },
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => Expr::If {
                cond: Box::new(self.expr(cond)?),
                then_branch: Box::new(self.expr(then_branch)?),
                else_branch: Box::new(self.expr(else_branch)?),
            },
            ExprKind::Array(elems) | ExprKind::Tuple(elems) => Expr::Object(
                elems
                    .iter()
                    .map(|elem| self.expr(elem))
                    .collect::<Result<Vec<_>>>()?,
            ),
            ExprKind::Index { object, index } => Expr::Index {
                object: Box::new(self.expr(object)?),
                index: Box::new(self.expr(index)?),
            },
            ExprKind::Member { object, member } => Expr::Member {
                offset: self.offset(&object.ty, member)?,
                object: Box::new(self.expr(object)?),
            },
            ExprKind::Call { path, args } => {
                if expr.ty.is_tuple() {
                    return Err(LowerError::TupleCall {
                        callee: path.clone(),
                        function: self.function.clone(),
                    });
                }
                Expr::Call {
                    name: path.clone(),
                    args: args
                        .iter()
                        .map(|arg| self.expr(arg))
                        .collect::<Result<Vec<_>>>()?,
                }
            }
        };
        Ok(lowered)
    }

    fn lhs(&self, lhs: &Lhs) -> Result<Lvalue> {
        let lowered = match &lhs.kind {
            LhsKind::Wild => Lvalue::Void,
            LhsKind::Id(name) => Lvalue::Ref(name.clone()),
            LhsKind::Member { object, member } => {
                let offset = self.offset(&object.ty, member)?;
                Lvalue::Member(Box::new(self.lhs(object)?), offset)
            }
            LhsKind::Index { object, index } => {
                Lvalue::Index(Box::new(self.lhs(object)?), Box::new(self.expr(index)?))
            }
            LhsKind::Tuple(elems) => Lvalue::Tuple(
                elems
                    .iter()
                    .map(|elem| self.lhs(elem))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(lowered)
    }

    fn offset(&self, ty: &Type, member: &str) -> Result<usize> {
        let name = ty.struct_name().ok_or_else(|| LowerError::NotAStruct {
            member: member.to_string(),
            ty: ty.clone(),
        })?;
        if !self.types.has_struct(name) {
            return Err(LowerError::UnknownStruct { name: name.clone() });
        }
        self.types
            .member_offset(name, member)
            .ok_or_else(|| LowerError::UnknownMember {
                ty: name.clone(),
                member: member.to_string(),
            })
    }
}
