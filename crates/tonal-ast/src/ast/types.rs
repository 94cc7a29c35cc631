//! Type descriptors.
//!
//! - **Scalars** - `int`, `real`, `fix16` (fixed-point real), `bool`, `string`
//! - **Void** - result of calls made for their effect
//! - **Array** - fixed-size, the dimension is part of the type
//! - **Tuple** - ordered, anonymous; eliminated by normalization
//! - **Struct** - named; member order lives in the declaring `TypeDecl`
//!
//! Struct member order is part of a type's identity: the lowering resolves
//! member access to an index into that order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::foundation::Path;

/// A type in the tonal type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// No value
    Void,
    /// Machine integer
    Int,
    /// Floating-point real
    Real,
    /// Fixed-point real (16.16)
    Fix16,
    /// Boolean
    Bool,
    /// String
    String,
    /// Fixed-size array
    Array {
        /// Element type
        elem: Box<Type>,
        /// Number of elements
        size: usize,
    },
    /// Tuple of component types
    Tuple(Vec<Type>),
    /// Named struct, resolved through the type table
    Struct(Path),
}

impl Type {
    /// Create an array type.
    pub fn array(elem: Type, size: usize) -> Self {
        Type::Array {
            elem: Box::new(elem),
            size,
        }
    }

    /// Create a struct type from a path-like name.
    pub fn named(name: impl Into<Path>) -> Self {
        Type::Struct(name.into())
    }

    /// Check if this is Void.
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Check if this is a tuple type.
    pub fn is_tuple(&self) -> bool {
        matches!(self, Type::Tuple(_))
    }

    /// Component types of a tuple, if this is a tuple.
    pub fn tuple_elems(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// Fixed dimension of an array, if this is an array.
    pub fn array_size(&self) -> Option<usize> {
        match self {
            Type::Array { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// Element type of an array, if this is an array.
    pub fn array_elem(&self) -> Option<&Type> {
        match self {
            Type::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Name of a struct type, if this is a struct.
    pub fn struct_name(&self) -> Option<&Path> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }

    /// Every struct name this type mentions, outermost first.
    ///
    /// Arrays and tuples are looked through, so `array(Voice, 4)` mentions
    /// `Voice`.
    pub fn referenced_structs(&self) -> Vec<&Path> {
        let mut out = Vec::new();
        self.collect_structs(&mut out);
        out
    }

    fn collect_structs<'a>(&'a self, out: &mut Vec<&'a Path>) {
        match self {
            Type::Struct(name) => out.push(name),
            Type::Array { elem, .. } => elem.collect_structs(out),
            Type::Tuple(elems) => {
                for elem in elems {
                    elem.collect_structs(out);
                }
            }
            Type::Void | Type::Int | Type::Real | Type::Fix16 | Type::Bool | Type::String => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "unit"),
            Type::Int => write!(f, "int"),
            Type::Real => write!(f, "real"),
            Type::Fix16 => write!(f, "fix16"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Array { elem, size } => write!(f, "array({elem}, {size})"),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Type::Struct(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_structs_looks_through_containers() {
        let ty = Type::Tuple(vec![
            Type::array(Type::named("Voice"), 4),
            Type::Int,
            Type::named("Env"),
        ]);
        let names: Vec<String> = ty
            .referenced_structs()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(names, vec!["Voice", "Env"]);
    }

    #[test]
    fn test_display() {
        let ty = Type::Tuple(vec![Type::Int, Type::array(Type::Real, 8)]);
        assert_eq!(ty.to_string(), "(int, array(real, 8))");
    }

    #[test]
    fn test_serde_representation() {
        let ty: Type = serde_json::from_str(r#"{"array": {"elem": "real", "size": 2}}"#).unwrap();
        assert_eq!(ty, Type::array(Type::Real, 2));

        let ty: Type = serde_json::from_str(r#"{"struct": "osc.state"}"#).unwrap();
        assert_eq!(ty, Type::named("osc.state"));
    }
}
