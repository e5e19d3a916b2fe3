use super::{NodeData, Point, TextRange, Tree, TreeId};
use crate::error::QueryError;
use std::collections::HashMap;
use std::sync::Arc;

struct Frame {
    index: u32,
    children: Vec<(u32, Option<u16>)>,
}

/// Builds a [`Tree`] from open/close events in document order.
///
/// Points are derived from byte offsets, so callers only supply bytes. In the
/// default checked mode, overlapping siblings and children escaping their
/// parent are rejected with [`QueryError::MalformedTree`].
pub struct TreeBuilder {
    source: Arc<str>,
    line_starts: Vec<usize>,
    checked: bool,
    nodes: Vec<NodeData>,
    child_ids: Vec<u32>,
    child_fields: Vec<Option<u16>>,
    kinds: Vec<Box<str>>,
    kind_lookup: HashMap<Box<str>, u16>,
    field_names: Vec<Box<str>>,
    field_lookup: HashMap<Box<str>, u16>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        TreeBuilder {
            source,
            line_starts,
            checked: true,
            nodes: Vec::new(),
            child_ids: Vec::new(),
            child_fields: Vec::new(),
            kinds: Vec::new(),
            kind_lookup: HashMap::new(),
            field_names: Vec::new(),
            field_lookup: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Skip ordering and containment checks. Used for parser output, where
    /// some grammars attach nodes outside their parent's range.
    pub fn unchecked(mut self) -> Self {
        self.checked = false;
        self
    }

    /// Open a named node.
    pub fn open(&mut self, kind: &str, field: Option<&str>, start: usize) -> Result<(), QueryError> {
        self.open_node(kind, true, field, start)
    }

    pub fn open_node(&mut self, kind: &str, named: bool, field: Option<&str>, start: usize) -> Result<(), QueryError> {
        if start > self.source.len() {
            return Err(QueryError::MalformedTree(format!(
                "`{}` starts at byte {} past the end of the source ({} bytes)",
                kind,
                start,
                self.source.len()
            )));
        }
        let index = self.nodes.len() as u32;
        let field = field.map(|f| self.intern_field(f));
        let parent = match self.stack.last() {
            Some(frame) => Some(frame.index),
            None if self.nodes.is_empty() => None,
            None => return Err(QueryError::MalformedTree(format!("second root `{}`", kind))),
        };

        if self.checked {
            if let Some(frame) = self.stack.last() {
                let parent_start = self.nodes[frame.index as usize].range.start_byte;
                if start < parent_start {
                    return Err(QueryError::MalformedTree(format!(
                        "`{}` at byte {} starts before its parent at {}",
                        kind, start, parent_start
                    )));
                }
                if let Some(&(prev, _)) = frame.children.last() {
                    let prev_end = self.nodes[prev as usize].range.end_byte;
                    if start < prev_end {
                        return Err(QueryError::MalformedTree(format!(
                            "`{}` at byte {} overlaps previous sibling ending at {}",
                            kind, start, prev_end
                        )));
                    }
                }
            }
        }

        let sibling_index = match self.stack.last_mut() {
            Some(frame) => {
                frame.children.push((index, field));
                frame.children.len() as u32 - 1
            }
            None => 0,
        };
        let kind = self.intern_kind(kind);
        let point = self.point_at(start);
        self.nodes.push(NodeData {
            kind,
            named,
            range: TextRange { start_byte: start, end_byte: start, start: point, end: point },
            parent,
            sibling_index,
            children_start: 0,
            children_len: 0,
            depth: self.stack.len() as u32,
            subtree_end: index + 1,
        });
        self.stack.push(Frame { index, children: Vec::new() });
        Ok(())
    }

    /// Close the most recently opened node.
    pub fn close(&mut self, end: usize) -> Result<(), QueryError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| QueryError::MalformedTree("close without a matching open".to_string()))?;
        let start = self.nodes[frame.index as usize].range.start_byte;
        if end < start || end > self.source.len() {
            return Err(QueryError::MalformedTree(format!(
                "node at byte {} has invalid end {}",
                start, end
            )));
        }
        if self.checked {
            if let Some(&(last, _)) = frame.children.last() {
                let last_end = self.nodes[last as usize].range.end_byte;
                if last_end > end {
                    return Err(QueryError::MalformedTree(format!(
                        "child ending at {} escapes parent ending at {}",
                        last_end, end
                    )));
                }
            }
        }

        let children_start = self.child_ids.len() as u32;
        for (child, field) in &frame.children {
            self.child_ids.push(*child);
            self.child_fields.push(*field);
        }
        let point = self.point_at(end);
        let subtree_end = self.nodes.len() as u32;
        let data = &mut self.nodes[frame.index as usize];
        data.range.end_byte = end;
        data.range.end = point;
        data.children_start = children_start;
        data.children_len = frame.children.len() as u32;
        data.subtree_end = subtree_end;
        Ok(())
    }

    /// Named node with no children.
    pub fn leaf(&mut self, kind: &str, field: Option<&str>, start: usize, end: usize) -> Result<(), QueryError> {
        self.open_node(kind, true, field, start)?;
        self.close(end)
    }

    /// Anonymous token.
    pub fn token(&mut self, kind: &str, field: Option<&str>, start: usize, end: usize) -> Result<(), QueryError> {
        self.open_node(kind, false, field, start)?;
        self.close(end)
    }

    pub fn finish(self) -> Result<Tree, QueryError> {
        if !self.stack.is_empty() {
            return Err(QueryError::MalformedTree(format!("{} node(s) left open", self.stack.len())));
        }
        if self.nodes.is_empty() {
            return Err(QueryError::MalformedTree("tree has no root".to_string()));
        }
        Ok(Tree {
            id: TreeId::next(),
            source: self.source,
            nodes: self.nodes,
            child_ids: self.child_ids,
            child_fields: self.child_fields,
            kinds: self.kinds,
            field_names: self.field_names,
        })
    }

    fn point_at(&self, byte: usize) -> Point {
        let row = self.line_starts.partition_point(|&s| s <= byte).saturating_sub(1);
        Point { row, column: byte - self.line_starts[row] }
    }

    fn intern_kind(&mut self, kind: &str) -> u16 {
        if let Some(&id) = self.kind_lookup.get(kind) {
            return id;
        }
        let id = self.kinds.len() as u16;
        self.kinds.push(kind.into());
        self.kind_lookup.insert(kind.into(), id);
        id
    }

    fn intern_field(&mut self, field: &str) -> u16 {
        if let Some(&id) = self.field_lookup.get(field) {
            return id;
        }
        let id = self.field_names.len() as u16;
        self.field_names.push(field.into());
        self.field_lookup.insert(field.into(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlapping_siblings() {
        let mut b = TreeBuilder::new("abcdef");
        b.open("root", None, 0).unwrap();
        b.leaf("a", None, 0, 3).unwrap();
        let err = b.leaf("b", None, 2, 4).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn rejects_child_escaping_parent() {
        let mut b = TreeBuilder::new("abcdef");
        b.open("root", None, 0).unwrap();
        b.open("inner", None, 0).unwrap();
        b.leaf("a", None, 1, 5).unwrap();
        assert!(b.close(3).is_err());
    }

    #[test]
    fn rejects_second_root_and_unclosed_nodes() {
        let mut b = TreeBuilder::new("ab");
        b.leaf("a", None, 0, 1).unwrap();
        assert!(b.leaf("b", None, 1, 2).is_err());

        let mut b = TreeBuilder::new("ab");
        b.open("a", None, 0).unwrap();
        assert!(b.finish().is_err());
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let mut b = TreeBuilder::new("ab");
        assert!(b.open("a", None, 5).is_err());
        let mut b = TreeBuilder::new("ab");
        b.open("a", None, 0).unwrap();
        assert!(b.close(9).is_err());
    }

    #[test]
    fn unchecked_mode_accepts_displaced_children() {
        let mut b = TreeBuilder::new("abcdef").unchecked();
        b.open("root", None, 0).unwrap();
        b.open("call", None, 0).unwrap();
        b.leaf("heredoc_body", None, 4, 6).unwrap();
        b.close(3).unwrap();
        b.close(6).unwrap();
        let tree = b.finish().unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn zero_width_children_are_allowed() {
        let mut b = TreeBuilder::new("ab");
        b.open("root", None, 0).unwrap();
        b.leaf("a", None, 0, 1).unwrap();
        b.token(")", None, 1, 1).unwrap();
        b.leaf("b", None, 1, 2).unwrap();
        b.close(2).unwrap();
        assert!(b.finish().is_ok());
    }

    #[test]
    fn subtree_end_covers_descendants() {
        let mut b = TreeBuilder::new("abc");
        b.open("root", None, 0).unwrap();
        b.open("x", None, 0).unwrap();
        b.leaf("y", None, 0, 1).unwrap();
        b.close(1).unwrap();
        b.leaf("z", None, 2, 3).unwrap();
        b.close(3).unwrap();
        let tree = b.finish().unwrap();
        let x = tree.root().child(0).unwrap();
        assert_eq!(x.subtree_end(), 3);
        assert_eq!(tree.root().subtree_end(), 4);
    }
}
