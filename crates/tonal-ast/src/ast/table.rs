//! Lookup table of user-defined types and functions.
//!
//! Built from a [`Program`]. The passes consult it for signatures, and the
//! VM lowering consults it for struct member order (member access compiles to
//! an index into that order).

use indexmap::IndexMap;

use super::decl::{Decl, Member, Program};
use super::types::Type;
use crate::foundation::Path;

/// Parameter and result types of a declared function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
    /// Declared `external`: no body, bound by the emitting backend
    pub external: bool,
}

/// Struct member orders and function signatures, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    structs: IndexMap<Path, Vec<Member>>,
    functions: IndexMap<Path, Signature>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every type and function declared in `program`.
    pub fn from_program(program: &Program) -> Self {
        let mut table = Self::new();
        for decl in &program.decls {
            match decl {
                Decl::Type(t) => table.insert_struct(t.name.clone(), t.members.clone()),
                Decl::Function(f) => table.insert_function(
                    f.name.clone(),
                    Signature {
                        params: f.params.iter().map(|p| p.ty.clone()).collect(),
                        ret: f.ret.clone(),
                        external: false,
                    },
                ),
                Decl::External(e) => table.insert_function(
                    e.name.clone(),
                    Signature {
                        params: e.params.iter().map(|p| p.ty.clone()).collect(),
                        ret: e.ret.clone(),
                        external: true,
                    },
                ),
            }
        }
        table
    }

    pub fn insert_struct(&mut self, name: Path, members: Vec<Member>) {
        self.structs.insert(name, members);
    }

    pub fn insert_function(&mut self, name: Path, signature: Signature) {
        self.functions.insert(name, signature);
    }

    /// Members of a struct, in declaration order.
    pub fn members(&self, name: &Path) -> Option<&[Member]> {
        self.structs.get(name).map(Vec::as_slice)
    }

    /// Index of `member` in the declaration order of struct `name`.
    pub fn member_offset(&self, name: &Path, member: &str) -> Option<usize> {
        self.members(name)?.iter().position(|m| m.name == member)
    }

    pub fn signature(&self, name: &Path) -> Option<&Signature> {
        self.functions.get(name)
    }

    pub fn is_external(&self, name: &Path) -> bool {
        self.functions.get(name).is_some_and(|sig| sig.external)
    }

    pub fn has_struct(&self, name: &Path) -> bool {
        self.structs.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExternDecl, FunctionDecl, Param, TypeDecl};

    #[test]
    fn test_member_offsets_follow_declaration_order() {
        let program = Program::new(vec![Decl::Type(TypeDecl::new(
            "Voice",
            vec![
                Member::new("pitch", Type::Real),
                Member::new("gate", Type::Bool),
                Member::new("phase", Type::Real),
            ],
        ))]);
        let table = TypeTable::from_program(&program);
        let voice = Path::from("Voice");
        assert_eq!(table.member_offset(&voice, "pitch"), Some(0));
        assert_eq!(table.member_offset(&voice, "phase"), Some(2));
        assert_eq!(table.member_offset(&voice, "missing"), None);
    }

    #[test]
    fn test_external_flag() {
        let program = Program::new(vec![
            Decl::External(ExternDecl::new(
                "sin",
                vec![Param::new("x", Type::Real)],
                Type::Real,
            )),
            Decl::Function(FunctionDecl::new("f", vec![], Type::Void, vec![])),
        ]);
        let table = TypeTable::from_program(&program);
        assert!(table.is_external(&Path::from("sin")));
        assert!(!table.is_external(&Path::from("f")));
        assert!(!table.is_external(&Path::from("unknown")));
    }
}
