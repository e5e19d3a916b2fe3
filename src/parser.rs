use crate::error::QueryError;
use crate::languages::{self, Language};
use crate::schema::Schema;
use crate::tree::{Tree, TreeBuilder};
use std::sync::OnceLock;
use tree_sitter::Parser;

/// Parse source code into a Tree-sitter AST
pub fn parse_tree_sitter(source: &str, language: Language) -> Result<tree_sitter::Tree, QueryError> {
    let mut parser = Parser::new();

    parser
        .set_language(&languages::ts_language(language))
        .map_err(|e| QueryError::ParseError(format!("Failed to set language: {}", e)))?;

    parser
        .parse(source, None)
        .ok_or_else(|| QueryError::ParseError("Failed to parse source code".to_string()))
}

/// Parse `source` and convert the result into a [`Tree`].
pub fn parse(source: &str, language: Language) -> Result<Tree, QueryError> {
    let ts_tree = parse_tree_sitter(source, language)?;
    let tree = convert(source, &ts_tree)?;
    tracing::debug!(language = %language, nodes = tree.len(), bytes = source.len(), "parsed");
    Ok(tree)
}

/// Copy a tree-sitter tree node by node, anonymous tokens and extras included.
///
/// Unchecked because some grammars (Ruby heredoc bodies) place a child
/// outside its parent's byte range.
pub fn convert(source: &str, ts_tree: &tree_sitter::Tree) -> Result<Tree, QueryError> {
    let mut builder = TreeBuilder::new(source).unchecked();
    let mut cursor = ts_tree.walk();
    loop {
        let node = cursor.node();
        builder.open_node(node.kind(), node.is_named(), cursor.field_name(), node.start_byte())?;
        if cursor.goto_first_child() {
            continue;
        }
        builder.close(node.end_byte())?;
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            builder.close(cursor.node().end_byte())?;
        }
    }
}

static SCHEMAS: [OnceLock<Result<Schema, String>>; 7] = [const { OnceLock::new() }; 7];

/// The schema of a built-in language, loaded once per process.
pub fn schema(language: Language) -> Result<&'static Schema, QueryError> {
    let slot = &SCHEMAS[language as usize];
    let loaded = slot.get_or_init(|| {
        tracing::debug!(language = %language, "loading node types");
        Schema::from_node_types(languages::node_types(language)).map_err(|e| e.to_string())
    });
    loaded.as_ref().map_err(|msg| QueryError::Schema(msg.clone()))
}
