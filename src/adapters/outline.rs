use super::label;
use crate::classify::{Category, ClassifiedCapture};
use crate::error::QueryError;
use crate::tree::TextRange;
use serde::Serialize;

/// One entry of an outline, with nested entries below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// 1-based.
    pub line: usize,
    pub range: TextRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// Nest the outline items of a classified stream by their ordinal paths.
/// Other categories are ignored.
pub fn build<'t, I>(captures: I) -> Result<Vec<OutlineNode>, QueryError>
where
    I: IntoIterator<Item = Result<ClassifiedCapture<'t>, QueryError>>,
{
    let mut roots = Vec::new();
    for capture in captures {
        let capture = capture?;
        if capture.category != Category::OutlineItem {
            continue;
        }
        let node = OutlineNode {
            name: label(&capture),
            kind: capture.node.kind().to_string(),
            context: capture.context.iter().map(|c| c.to_string()).collect(),
            line: capture.range.start.row + 1,
            range: capture.range,
            children: Vec::new(),
        };
        insert(&mut roots, &capture.ordinal_path, node);
    }
    Ok(roots)
}

fn insert(nodes: &mut Vec<OutlineNode>, path: &[usize], node: OutlineNode) {
    match path {
        [first, rest @ ..] if !rest.is_empty() => match nodes.get_mut(*first) {
            Some(parent) => insert(&mut parent.children, rest, node),
            None => nodes.push(node),
        },
        _ => nodes.push(node),
    }
}

/// Indented plain-text rendering, one entry per line.
pub fn render(nodes: &[OutlineNode]) -> String {
    let mut out = String::new();
    render_into(nodes, 0, &mut out);
    out
}

fn render_into(nodes: &[OutlineNode], depth: usize, out: &mut String) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        for context in &node.context {
            out.push_str(context);
            out.push(' ');
        }
        out.push_str(&node.name);
        out.push_str(&format!(" (L{})\n", node.line));
        render_into(&node.children, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture;

    const OUTLINE: &str = r#"
        (class "class" @context name: (constant) @name) @item
        (method "def" @context name: (identifier) @name) @item
    "#;

    #[test]
    fn nests_by_containment() {
        let tree = fixture::tree();
        let captures = fixture::classify(&tree, OUTLINE);
        let outline = build(captures.into_iter().map(Ok)).unwrap();

        assert_eq!(outline.len(), 1);
        let shop = &outline[0];
        assert_eq!(shop.name, "Shop");
        assert_eq!(shop.context, vec!["class"]);
        assert_eq!(shop.line, 1);
        let names: Vec<_> = shop.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["total", "Cart"]);
        assert_eq!(shop.children[1].children[0].name, "empty?");
        assert_eq!(shop.children[1].children[0].line, 8);
    }

    #[test]
    fn renders_indented_lines() {
        let tree = fixture::tree();
        let outline = build(fixture::classify(&tree, OUTLINE).into_iter().map(Ok)).unwrap();
        assert_eq!(
            render(&outline),
            "class Shop (L1)\n  def total (L3)\n  class Cart (L7)\n    def empty? (L8)\n"
        );
    }

    #[test]
    fn errors_propagate() {
        let stream: Vec<Result<ClassifiedCapture<'_>, QueryError>> = vec![Err(QueryError::Internal("broken".into()))];
        assert!(build(stream).is_err());
    }
}
