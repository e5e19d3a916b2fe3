use crate::tree::NodeId;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Node {0} does not belong to this tree")]
    InvalidNode(NodeId),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Invalid language schema: {0}")]
    Schema(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("No file extension found for path: {0}")]
    NoExtension(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unknown built-in query: {0} (expected outline, runnables, textobjects, debugger or injections)")]
    UnknownBuiltin(String),

    #[error("No built-in {builtin} query for {language}")]
    MissingBuiltin { builtin: String, language: String },

    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error")]
    SerializationError(#[from] serde_json::Error),
}

/// A query source that failed to compile, with the location of the offending token.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Query error at {row}:{column}: {kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Byte offset into the query source.
    pub offset: usize,
    /// 1-based line.
    pub row: usize,
    /// 1-based column.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    UnknownNodeKind(String),
    UnknownField(String),
    MalformedQuantifier(String),
    SyntaxError(String),
    UnknownCapture(String),
    InvalidPredicate(String),
    InvalidRegex(String),
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::UnknownNodeKind(kind) => write!(f, "unknown node kind `{}`", kind),
            CompileErrorKind::UnknownField(field) => write!(f, "unknown field `{}`", field),
            CompileErrorKind::MalformedQuantifier(msg) => write!(f, "malformed quantifier: {}", msg),
            CompileErrorKind::SyntaxError(msg) => write!(f, "syntax error: {}", msg),
            CompileErrorKind::UnknownCapture(name) => write!(f, "unknown capture `@{}`", name),
            CompileErrorKind::InvalidPredicate(msg) => write!(f, "invalid predicate: {}", msg),
            CompileErrorKind::InvalidRegex(msg) => write!(f, "invalid regex: {}", msg),
        }
    }
}

impl CompileError {
    /// Build an error at `offset`, resolving row and column against the query source.
    pub fn at(source: &str, offset: usize, kind: CompileErrorKind) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let row = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        CompileError { kind, offset, row, column }
    }
}
