//! Go syntax tree for the generated wrapper file.
//!
//! Only the constructs the wrapper needs are modelled. Hook fragments are
//! carried verbatim as [`GoStmt::Raw`].

use crate::types::Type;

/// A complete Go source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Leading comment, without the `// ` prefix.
    pub header: String,
    pub package: String,
    /// Imports in the order they are written.
    pub imports: Vec<GoImport>,
    pub decls: Vec<GoDecl>,
}

/// `alias "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    pub alias: String,
    pub path: String,
}

/// Top-level declaration.
#[derive(Debug, Clone)]
pub enum GoDecl {
    /// `type Name struct { fields }`
    Struct {
        doc: Option<String>,
        name: String,
        fields: Vec<GoField>,
    },
    /// `var name ty = value`; the type is left out when `None`.
    Var {
        name: String,
        ty: Option<Type>,
        value: String,
    },
    Func(GoFunc),
}

/// A struct field, parameter or named result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoField {
    pub name: String,
    pub ty: Type,
}

/// Function or method declaration.
#[derive(Debug, Clone)]
pub struct GoFunc {
    pub doc: Option<String>,
    pub receiver: Option<GoField>,
    pub name: String,
    pub params: Vec<GoField>,
    pub results: Vec<GoField>,
    /// Whether the last parameter is written as `...T`.
    pub variadic: bool,
    pub body: Vec<GoStmt>,
}

/// Statement inside a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoStmt {
    /// Verbatim code, possibly spanning several lines.
    Raw(String),
    /// An empty line separating groups of statements.
    Blank,
    If {
        cond: String,
        then_body: Vec<GoStmt>,
        else_body: Option<Vec<GoStmt>>,
    },
    Return(Vec<String>),
}
