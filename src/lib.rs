//! Structural queries over source code.
//!
//! Source text is parsed with tree-sitter and copied into an immutable
//! [`Tree`]. Queries in the tree-sitter s-expression dialect are compiled once
//! against a language [`Schema`] and matched lazily; a [`Classifier`] turns
//! raw captures into semantic categories for outlines, text objects and test
//! runners.

pub mod adapters;
pub mod classify;
pub mod engine;
mod error;
pub mod languages;
mod output;
pub mod parser;
pub mod query;
pub mod schema;
pub mod tree;
mod walk;

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub use classify::{Category, ClassifiedCapture, Classifier, ClassifierRules};
pub use engine::{matches, MatchOptions, Matches, QueryCapture, QueryMatch};
pub use error::{CompileError, CompileErrorKind, QueryError};
pub use languages::{Builtin, Language};
pub use output::OutputFormat;
pub use query::{compile, Property, Quantifier, Query};
pub use schema::{Schema, SchemaBuilder};
pub use tree::{Node, NodeId, Point, TextRange, Tree, TreeBuilder, TreeId};

use adapters::outline::OutlineNode;
use adapters::runnables::Runnable;

/// One capture of one match, with 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRecord {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub text: String,
}

/// Owned form of a [`ClassifiedCapture`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRecord {
    pub category: Category,
    pub capture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub ordinal_path: Vec<usize>,
    pub text: String,
}

impl From<&ClassifiedCapture<'_>> for ClassifiedRecord {
    fn from(c: &ClassifiedCapture<'_>) -> Self {
        let start = c.range.start;
        ClassifiedRecord {
            category: c.category.clone(),
            capture: c.capture.clone(),
            name: c.name.map(str::to_string),
            line: start.row + 1,
            column: start.column + 1,
            end_line: c.range.end.row + 1,
            ordinal_path: c.ordinal_path.clone(),
            text: c.text.to_string(),
        }
    }
}

/// What to print for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Raw captures.
    #[default]
    Captures,
    Classified,
    Outline,
    Runnables,
}

/// Per-file result of [`process_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileReport {
    Captures(Vec<CaptureRecord>),
    Classified(Vec<ClassifiedRecord>),
    Outline(Vec<OutlineNode>),
    Runnables(Vec<Runnable>),
}

impl FileReport {
    pub fn is_empty(&self) -> bool {
        match self {
            FileReport::Captures(v) => v.is_empty(),
            FileReport::Classified(v) => v.is_empty(),
            FileReport::Outline(v) => v.is_empty(),
            FileReport::Runnables(v) => v.is_empty(),
        }
    }
}

/// Where the query comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Builtin(Builtin),
    Text(String),
}

/// Options for processing paths
pub struct ProcessOptions {
    pub query: QuerySource,
    /// Parse every file as this language instead of detecting it.
    pub language: Option<Language>,
    pub view: View,
    pub format: OutputFormat,
    /// Maximum matches per file.
    pub limit: Option<usize>,
    pub depth: Option<usize>,
    pub ext: Vec<String>,
    /// Classifier rules; the built-in rules when absent.
    pub rules: Option<ClassifierRules>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        ProcessOptions {
            query: QuerySource::Builtin(Builtin::Outline),
            language: None,
            view: View::Captures,
            format: OutputFormat::Plain,
            limit: None,
            depth: None,
            ext: Vec::new(),
            rules: None,
        }
    }
}

/// Compiled queries per language, compiled on first use.
struct QueryCache<'a> {
    source: &'a QuerySource,
    compiled: HashMap<Language, Query>,
}

impl<'a> QueryCache<'a> {
    fn new(source: &'a QuerySource) -> Self {
        QueryCache { source, compiled: HashMap::new() }
    }

    fn get(&mut self, language: Language) -> Result<&Query, QueryError> {
        if !self.compiled.contains_key(&language) {
            let source: &'a QuerySource = self.source;
            let text = match source {
                QuerySource::Text(text) => text.as_str(),
                QuerySource::Builtin(builtin) => builtin_source(language, *builtin)?,
            };
            let query = Query::new(text, parser::schema(language)?)?;
            self.compiled.insert(language, query);
        }
        self.compiled
            .get(&language)
            .ok_or_else(|| QueryError::Internal(format!("query for {} missing from cache", language)))
    }
}

fn builtin_source(language: Language, builtin: Builtin) -> Result<&'static str, QueryError> {
    languages::builtin_query(language, builtin).ok_or_else(|| QueryError::MissingBuiltin {
        builtin: format!("{:?}", builtin).to_lowercase(),
        language: language.to_string(),
    })
}

/// Compile a built-in query for `language`.
pub fn builtin(language: Language, builtin: Builtin) -> Result<Query, QueryError> {
    Ok(Query::new(builtin_source(language, builtin)?, parser::schema(language)?)?)
}

/// Process a file or directory and return formatted output
pub fn process_path(path: &str, options: ProcessOptions) -> Result<String, QueryError> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(QueryError::PathNotFound(path.display().to_string()));
    }

    let classifier = Classifier::new(options.rules.clone().unwrap_or_default());
    let mut queries = QueryCache::new(&options.query);
    let reports: Vec<(String, FileReport)> = if path.is_file() {
        let report = process_file(path, &options, &mut queries, &classifier)?;
        vec![(path.to_string_lossy().to_string(), report)]
    } else if path.is_dir() {
        let mut results = Vec::new();
        for file_path in walk::walk_directory(path, options.depth, &options.ext)? {
            match process_file(&file_path, &options, &mut queries, &classifier) {
                Ok(report) => results.push((file_path.to_string_lossy().to_string(), report)),
                // a query that does not compile fails for every file alike
                Err(QueryError::Compile(err)) => return Err(QueryError::Compile(err)),
                Err(err) => {
                    tracing::warn!(path = %file_path.display(), error = %err, "skipping file");
                }
            }
        }
        results
    } else {
        return Err(QueryError::InvalidPath(path.display().to_string()));
    };

    match options.format {
        OutputFormat::Plain => output::plain::format_output(&reports),
        OutputFormat::Json => output::json::format_output(&reports),
    }
}

fn process_file(
    path: &Path,
    options: &ProcessOptions,
    queries: &mut QueryCache<'_>,
    classifier: &Classifier,
) -> Result<FileReport, QueryError> {
    let source = fs::read_to_string(path).map_err(|e| QueryError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let source = normalize_line_endings(&source);
    let language = match options.language {
        Some(language) => language,
        None => languages::detect_language(path)?,
    };
    let tree = parser::parse(&source, language)?;
    let query = queries.get(language)?;
    let match_options = MatchOptions { limit: options.limit, ..Default::default() };
    let found = matches(&tree, query, &match_options)?;

    Ok(match options.view {
        View::Captures => FileReport::Captures(capture_records(found)?),
        View::Classified => FileReport::Classified(
            classifier
                .classify(found)
                .map(|c| c.map(|c| ClassifiedRecord::from(&c)))
                .collect::<Result<_, _>>()?,
        ),
        View::Outline => FileReport::Outline(adapters::outline::build(classifier.classify(found))?),
        View::Runnables => FileReport::Runnables(adapters::runnables::detect(classifier.classify(found))?),
    })
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn capture_records(found: Matches<'_, '_>) -> Result<Vec<CaptureRecord>, QueryError> {
    let mut records = Vec::new();
    for m in found {
        let m = m?;
        for capture in m.captures() {
            let start = capture.node.start_position();
            records.push(CaptureRecord {
                name: m.capture_name(capture).to_string(),
                line: start.row + 1,
                column: start.column + 1,
                text: capture.node.text().to_string(),
            });
        }
    }
    Ok(records)
}

/// Run `query_source` over `source` and flatten every match into capture records.
pub fn run_query(source: &str, query_source: &str, language: Language) -> Result<Vec<CaptureRecord>, QueryError> {
    let source = normalize_line_endings(source);
    let tree = parser::parse(&source, language)?;
    let query = Query::new(query_source, parser::schema(language)?)?;
    capture_records(matches(&tree, &query, &MatchOptions::default())?)
}

/// Run and classify `query_source` over `source` with the built-in rules.
pub fn classify_source(
    source: &str,
    query_source: &str,
    language: Language,
) -> Result<Vec<ClassifiedRecord>, QueryError> {
    let source = normalize_line_endings(source);
    let tree = parser::parse(&source, language)?;
    let query = Query::new(query_source, parser::schema(language)?)?;
    let found = matches(&tree, &query, &MatchOptions::default())?;
    Classifier::default()
        .classify(found)
        .map(|c| c.map(|c| ClassifiedRecord::from(&c)))
        .collect()
}

/// Outline of `source` from the language's built-in outline query.
pub fn outline(source: &str, language: Language) -> Result<Vec<OutlineNode>, QueryError> {
    let source = normalize_line_endings(source);
    let tree = parser::parse(&source, language)?;
    let query = builtin(language, Builtin::Outline)?;
    let found = matches(&tree, &query, &MatchOptions::default())?;
    adapters::outline::build(Classifier::default().classify(found))
}

/// Runnables in `source` from the language's built-in runnables query.
pub fn runnables(source: &str, language: Language) -> Result<Vec<Runnable>, QueryError> {
    let source = normalize_line_endings(source);
    let tree = parser::parse(&source, language)?;
    let query = builtin(language, Builtin::Runnables)?;
    let found = matches(&tree, &query, &MatchOptions::default())?;
    adapters::runnables::detect(Classifier::default().classify(found))
}
