//! Immutable syntax tree model.
//!
//! Nodes live in a single arena in preorder, so a node's subtree is the
//! contiguous index range `[index, subtree_end)`. Source text is owned by the
//! tree and node text is always a slice of it, never a concatenation of children.

mod builder;
#[cfg(test)]
pub(crate) mod sketch;

pub use builder::TreeBuilder;

use crate::error::QueryError;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Row and column, both 0-based. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
}

impl TextRange {
    pub fn contains(&self, other: &TextRange) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn len(&self) -> usize {
        self.end_byte - self.start_byte
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owned handle to a node. Resolve it against its tree with [`Tree::node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: TreeId,
    index: u32,
}

impl NodeId {
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (tree {})", self.index, self.tree.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: u16,
    pub(crate) named: bool,
    pub(crate) range: TextRange,
    pub(crate) parent: Option<u32>,
    pub(crate) sibling_index: u32,
    pub(crate) children_start: u32,
    pub(crate) children_len: u32,
    pub(crate) depth: u32,
    pub(crate) subtree_end: u32,
}

#[derive(Debug)]
pub struct Tree {
    id: TreeId,
    source: Arc<str>,
    nodes: Vec<NodeData>,
    child_ids: Vec<u32>,
    child_fields: Vec<Option<u16>>,
    kinds: Vec<Box<str>>,
    field_names: Vec<Box<str>>,
}

impl Tree {
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of nodes, named and anonymous.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Node<'_> {
        Node { tree: self, index: 0 }
    }

    /// Resolve an owned handle. Fails for handles minted by another tree.
    pub fn node(&self, id: NodeId) -> Result<Node<'_>, QueryError> {
        if id.tree != self.id || id.index as usize >= self.nodes.len() {
            return Err(QueryError::InvalidNode(id));
        }
        Ok(Node { tree: self, index: id.index })
    }

    pub fn children(&self, id: NodeId) -> Result<impl ExactSizeIterator<Item = Node<'_>> + '_, QueryError> {
        Ok(self.node(id)?.children())
    }

    pub fn field_value(&self, id: NodeId, field: &str) -> Result<Option<Node<'_>>, QueryError> {
        Ok(self.node(id)?.child_by_field_name(field))
    }

    pub fn children_by_field(&self, id: NodeId, field: &str) -> Result<Vec<Node<'_>>, QueryError> {
        Ok(self.node(id)?.children_by_field_name(field).collect())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<Node<'_>>, QueryError> {
        Ok(self.node(id)?.parent())
    }

    /// Exact source bytes `[start, end)` of the node.
    pub fn text_of(&self, id: NodeId) -> Result<&str, QueryError> {
        let node = self.node(id)?;
        self.source
            .get(node.byte_range())
            .ok_or_else(|| QueryError::Internal(format!("node {} range is not on a character boundary", id)))
    }

    /// Symbol for a kind string, if any node in this tree has that kind.
    pub(crate) fn kind_symbol(&self, kind: &str) -> Option<u16> {
        self.kinds.iter().position(|k| &**k == kind).map(|i| i as u16)
    }

    pub(crate) fn field_symbol(&self, field: &str) -> Option<u16> {
        self.field_names.iter().position(|f| &**f == field).map(|i| i as u16)
    }

    pub(crate) fn node_at(&self, index: u32) -> Node<'_> {
        Node { tree: self, index }
    }

    pub(crate) fn data(&self, index: u32) -> &NodeData {
        &self.nodes[index as usize]
    }

    fn child_slots(&self, index: u32) -> std::ops::Range<usize> {
        let data = self.data(index);
        let start = data.children_start as usize;
        start..start + data.children_len as usize
    }
}

/// Borrowed view of a node. Cannot outlive its [`Tree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    index: u32,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.tree.id == other.tree.id && self.index == other.index
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {}..{})", self.kind(), self.start_byte(), self.end_byte())
    }
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        NodeId { tree: self.tree.id, index: self.index }
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn kind(&self) -> &'t str {
        &self.tree.kinds[self.data().kind as usize]
    }

    pub fn is_named(&self) -> bool {
        self.data().named
    }

    pub fn start_byte(&self) -> usize {
        self.data().range.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.data().range.end_byte
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_position(&self) -> Point {
        self.data().range.start
    }

    pub fn end_position(&self) -> Point {
        self.data().range.end
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.data().depth as usize
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|index| self.tree.node_at(index))
    }

    pub fn child_count(&self) -> usize {
        self.data().children_len as usize
    }

    pub fn child(&self, i: usize) -> Option<Node<'t>> {
        self.child_ids().get(i).map(|&index| self.tree.node_at(index))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'t>> + DoubleEndedIterator + 't {
        let tree = self.tree;
        self.child_ids().iter().map(move |&index| tree.node_at(index))
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }

    /// Field name under which the i-th child is attached to this node.
    pub fn field_name_for_child(&self, i: usize) -> Option<&'t str> {
        let slot = self.tree.child_slots(self.index).nth(i)?;
        self.tree.child_fields[slot].map(|f| &*self.tree.field_names[f as usize])
    }

    pub fn child_by_field_name(&self, field: &str) -> Option<Node<'t>> {
        self.children_by_field_name(field).next()
    }

    pub fn children_by_field_name(&self, field: &str) -> impl Iterator<Item = Node<'t>> + 't {
        let symbol = self.tree.field_symbol(field);
        self.children_by_field_symbol(symbol)
    }

    pub(crate) fn children_by_field_symbol(&self, symbol: Option<u16>) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        let slots = match symbol {
            Some(_) => tree.child_slots(self.index),
            None => 0..0,
        };
        slots
            .filter(move |&slot| tree.child_fields[slot] == symbol)
            .map(move |slot| tree.node_at(tree.child_ids[slot]))
    }

    /// Exact source text covered by this node.
    pub fn text(&self) -> &'t str {
        self.tree.source.get(self.byte_range()).unwrap_or("")
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        self.sibling_index().checked_sub(1).and_then(|p| parent.child(p))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        self.parent()?.child(self.sibling_index() + 1)
    }

    pub(crate) fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn kind_symbol(&self) -> u16 {
        self.data().kind
    }

    /// Position of this node among its parent's children.
    pub(crate) fn sibling_index(&self) -> usize {
        self.data().sibling_index as usize
    }

    pub(crate) fn subtree_end(&self) -> u32 {
        self.data().subtree_end
    }

    pub(crate) fn child_ids(&self) -> &'t [u32] {
        let tree = self.tree;
        &tree.child_ids[tree.child_slots(self.index)]
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.index)
    }
}
