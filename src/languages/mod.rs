pub mod javascript;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod typescript;

use crate::error::QueryError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Ruby,
    Rust,
    TypeScript,
    Tsx,
    Python,
    JavaScript,
    Jsx,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Ruby,
        Language::Rust,
        Language::TypeScript,
        Language::Tsx,
        Language::Python,
        Language::JavaScript,
        Language::Jsx,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Jsx => "jsx",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rb" => Ok(Language::Ruby),
            "rs" => Ok(Language::Rust),
            "ts" => Ok(Language::TypeScript),
            "py" => Ok(Language::Python),
            "js" => Ok(Language::JavaScript),
            _ => Language::ALL
                .into_iter()
                .find(|l| l.name() == s)
                .ok_or_else(|| QueryError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Built-in query sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Outline,
    Runnables,
    TextObjects,
    Debugger,
    Injections,
}

impl FromStr for Builtin {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outline" => Ok(Builtin::Outline),
            "runnables" => Ok(Builtin::Runnables),
            "textobjects" => Ok(Builtin::TextObjects),
            "debugger" => Ok(Builtin::Debugger),
            "injections" => Ok(Builtin::Injections),
            _ => Err(QueryError::UnknownBuiltin(s.to_string())),
        }
    }
}

/// Detect language from file extension
pub fn detect_language(path: &Path) -> Result<Language, QueryError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| QueryError::NoExtension(path.display().to_string()))?;

    match extension {
        "rb" | "rake" | "gemspec" | "ru" => Ok(Language::Ruby),
        "rs" => Ok(Language::Rust),
        "ts" => Ok(Language::TypeScript),
        "tsx" => Ok(Language::Tsx),
        "js" => Ok(Language::JavaScript),
        "jsx" => Ok(Language::Jsx),
        "py" => Ok(Language::Python),
        _ => Err(QueryError::UnsupportedExtension(extension.to_string())),
    }
}

/// Check if a file should be processed based on its extension
pub fn is_supported_file(path: &Path) -> bool {
    detect_language(path).is_ok()
}

/// Get tree-sitter Language for a given language enum
pub fn ts_language(lang: Language) -> tree_sitter::Language {
    match lang {
        Language::Ruby => tree_sitter_ruby::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE.into(),
        Language::Python => tree_sitter_python::LANGUAGE.into(),
    }
}

/// The grammar's `node-types.json`.
pub fn node_types(lang: Language) -> &'static str {
    match lang {
        Language::Ruby => tree_sitter_ruby::NODE_TYPES,
        Language::Rust => tree_sitter_rust::NODE_TYPES,
        Language::TypeScript => tree_sitter_typescript::TYPESCRIPT_NODE_TYPES,
        Language::Tsx => tree_sitter_typescript::TSX_NODE_TYPES,
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::NODE_TYPES,
        Language::Python => tree_sitter_python::NODE_TYPES,
    }
}

/// Source of a built-in query, if the language ships one.
pub fn builtin_query(lang: Language, builtin: Builtin) -> Option<&'static str> {
    match (lang, builtin) {
        (Language::Ruby, Builtin::Outline) => Some(ruby::OUTLINE_QUERY),
        (Language::Ruby, Builtin::Runnables) => Some(ruby::RUNNABLES_QUERY),
        (Language::Ruby, Builtin::TextObjects) => Some(ruby::TEXTOBJECTS_QUERY),
        (Language::Ruby, Builtin::Debugger) => Some(ruby::DEBUGGER_QUERY),
        (Language::Ruby, Builtin::Injections) => Some(ruby::INJECTIONS_QUERY),
        (Language::Rust, Builtin::Outline) => Some(rust::OUTLINE_QUERY),
        (Language::TypeScript | Language::Tsx, Builtin::Outline) => Some(typescript::OUTLINE_QUERY),
        (Language::JavaScript | Language::Jsx, Builtin::Outline) => Some(javascript::OUTLINE_QUERY),
        (Language::Python, Builtin::Outline) => Some(python::OUTLINE_QUERY),
        _ => None,
    }
}
