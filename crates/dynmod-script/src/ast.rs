//! Compiled program representation.
//!
//! A [`Program`] is the transformer's output and the runtime's input. It is
//! encoded as JSON so that it can live in the compilation cache.

use serde::{Deserialize, Serialize};

/// A compiled module body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Statements in execution order
    pub statements: Vec<Statement>,
}

/// A statement and its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// 1-based source line
    pub line: u32,
    /// 1-based source column
    pub column: u32,
    /// What the statement does
    pub kind: StatementKind,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StatementKind {
    /// `let name = value`
    Let { name: String, value: Expr },
    /// `exports.name = value` or `export name = value`
    SetExport { name: String, value: Expr },
    /// `exports = value`
    ReplaceExports { value: Expr },
    /// `throw value`
    Throw { value: Expr },
    /// A bare expression, evaluated for its effects
    Eval { value: Expr },
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Expr>),
    /// A `let` binding
    Local(String),
    /// The module's current exports
    Exports,
    /// `__filename`
    Filename,
    /// `__dirname`
    Dirname,
    /// `require "specifier"`: synchronous lookup of a loaded module
    Require(String),
    /// `import "specifier"`: full asynchronous load
    Import(String),
    /// `base.name`
    Member(Box<Expr>, String),
}
