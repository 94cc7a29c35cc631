//! Top-level declarations and programs.

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::stmt::Stmt;
use super::types::Type;
use crate::foundation::{Path, Span};

/// A named function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A struct member. Declaration order is the runtime field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    /// Initial value, if the source gave one
    pub default: Option<Expr>,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

/// `type Name { members }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: Path,
    pub members: Vec<Member>,
    pub span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<Path>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
            span: Span::default(),
        }
    }
}

/// `fun name(params) : ret { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Path,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<Path>, params: Vec<Param>, ret: Type, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            body,
            span: Span::default(),
        }
    }
}

/// `external name(params) : ret "link_name"`
///
/// Declared here, defined by whatever the emitting backend links against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternDecl {
    pub name: Path,
    pub params: Vec<Param>,
    pub ret: Type,
    /// Symbol the backend binds to, when it differs from `name`
    pub link_name: Option<String>,
    pub span: Span,
}

impl ExternDecl {
    pub fn new(name: impl Into<Path>, params: Vec<Param>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            link_name: None,
            span: Span::default(),
        }
    }

    pub fn with_link_name(mut self, link_name: impl Into<String>) -> Self {
        self.link_name = Some(link_name.into());
        self
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Type(TypeDecl),
    Function(FunctionDecl),
    External(ExternDecl),
}

/// Declaration category, used to partition a program for linearization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Type,
    Function,
    External,
}

impl Decl {
    /// The declared name.
    pub fn name(&self) -> &Path {
        match self {
            Decl::Type(t) => &t.name,
            Decl::Function(f) => &f.name,
            Decl::External(e) => &e.name,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Type(_) => DeclKind::Type,
            Decl::Function(_) => DeclKind::Function,
            Decl::External(_) => DeclKind::External,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Type(t) => t.span,
            Decl::Function(f) => f.span,
            Decl::External(e) => e.span,
        }
    }
}

/// An ordered sequence of top-level declarations.
///
/// Order is source order until the pipeline linearizes it; afterwards every
/// declaration follows everything it depends on (cycles excepted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { decls }
    }

    /// Find a function by name.
    pub fn function(&self, name: &Path) -> Option<&FunctionDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Function(f) if &f.name == name => Some(f),
            _ => None,
        })
    }

    /// Declared names in program order.
    pub fn names(&self) -> Vec<&Path> {
        self.decls.iter().map(Decl::name).collect()
    }
}
