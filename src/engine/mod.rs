//! Match engine.
//!
//! [`matches`] walks a tree in preorder and tries every top-level pattern of a
//! query at each node, in declaration order. The walk is an index scan over
//! the tree's preorder arena and yields matches lazily, so dropping the
//! iterator early costs nothing.

mod anchor;

use crate::error::QueryError;
use crate::query::{Property, Query};
use crate::tree::{Node, NodeId, Tree};
use anchor::Anchorer;
use std::fmt;
use std::ops::Range;

/// Restrictions on a match run. The default visits the whole tree.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// Stop after this many matches.
    pub limit: Option<usize>,
    /// Only anchor at nodes intersecting this byte range.
    pub byte_range: Option<Range<usize>>,
    /// Only anchor at nodes at most this deep below the traversal root.
    pub max_start_depth: Option<usize>,
    /// Traverse this subtree instead of the whole tree.
    pub root: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapture<'t> {
    pub index: u32,
    pub node: Node<'t>,
}

/// One successful anchoring of one pattern.
///
/// Captures are ordered by node position, then by capture index.
#[derive(Clone)]
pub struct QueryMatch<'t, 'q> {
    query: &'q Query,
    pattern_index: usize,
    anchor: Node<'t>,
    captures: Vec<QueryCapture<'t>>,
}

impl<'t, 'q> QueryMatch<'t, 'q> {
    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    pub fn anchor(&self) -> Node<'t> {
        self.anchor
    }

    pub fn captures(&self) -> &[QueryCapture<'t>] {
        &self.captures
    }

    pub fn query(&self) -> &'q Query {
        self.query
    }

    pub fn capture_name(&self, capture: &QueryCapture<'t>) -> &'q str {
        self.query.capture_name(capture.index).unwrap_or_default()
    }

    /// Nodes bound to the capture `name`, in document order.
    pub fn nodes_for<'a>(&'a self, name: &str) -> impl Iterator<Item = Node<'t>> + 'a {
        let index = self.query.capture_index(name);
        self.captures
            .iter()
            .filter(move |c| Some(c.index) == index)
            .map(|c| c.node)
    }

    pub fn first(&self, name: &str) -> Option<Node<'t>> {
        self.nodes_for(name).next()
    }

    pub fn properties(&self) -> &'q [Property] {
        self.query.properties(self.pattern_index)
    }

    pub fn property(&self, key: &str) -> Option<Option<&'q str>> {
        self.query.property(self.pattern_index, key)
    }
}

impl fmt::Debug for QueryMatch<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let captures: Vec<_> = self
            .captures
            .iter()
            .map(|c| (self.capture_name(c), c.node))
            .collect();
        f.debug_struct("QueryMatch")
            .field("pattern_index", &self.pattern_index)
            .field("anchor", &self.anchor)
            .field("captures", &captures)
            .finish()
    }
}

/// Lazy sequence of matches. Ends after the first error.
pub struct Matches<'t, 'q> {
    tree: &'t Tree,
    query: &'q Query,
    anchorer: Anchorer<'t, 'q>,
    next_index: u32,
    end_index: u32,
    pattern: usize,
    exclusive_until: Vec<u32>,
    options: MatchOptions,
    base_depth: usize,
    yielded: usize,
    done: bool,
}

/// Start matching `query` against `tree`.
///
/// Fails with [`QueryError::InvalidNode`] if `options.root` belongs to another tree.
pub fn matches<'t, 'q>(tree: &'t Tree, query: &'q Query, options: &MatchOptions) -> Result<Matches<'t, 'q>, QueryError> {
    let root = match options.root {
        Some(id) => tree.node(id)?,
        None => tree.root(),
    };
    tracing::debug!(
        patterns = query.pattern_count(),
        nodes = tree.len(),
        root = %root.id(),
        "starting match"
    );
    Ok(Matches {
        tree,
        query,
        anchorer: Anchorer::new(tree, query, root.index()),
        next_index: root.index(),
        end_index: root.subtree_end(),
        pattern: 0,
        exclusive_until: vec![0; query.pattern_count()],
        options: options.clone(),
        base_depth: root.depth(),
        yielded: 0,
        done: false,
    })
}

impl Query {
    /// Shorthand for [`matches`].
    pub fn matches<'t, 'q>(&'q self, tree: &'t Tree, options: &MatchOptions) -> Result<Matches<'t, 'q>, QueryError> {
        matches(tree, self, options)
    }
}

impl<'t, 'q> Matches<'t, 'q> {
    /// Whether `node` may anchor. Nodes outside the range or too deep have
    /// their whole subtree skipped.
    fn admits(&self, node: Node<'t>) -> bool {
        if let Some(range) = &self.options.byte_range {
            let end = range.end.max(range.start + 1);
            if node.start_byte() >= end || node.end_byte() <= range.start {
                return false;
            }
        }
        if let Some(max) = self.options.max_start_depth {
            if node.depth() - self.base_depth > max {
                return false;
            }
        }
        true
    }
}

impl<'t, 'q> Iterator for Matches<'t, 'q> {
    type Item = Result<QueryMatch<'t, 'q>, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.options.limit.is_some_and(|limit| self.yielded >= limit) {
            self.done = true;
            return None;
        }

        while self.next_index < self.end_index {
            let index = self.next_index;
            let node = self.tree.node_at(index);
            if self.pattern == 0 && !self.admits(node) {
                self.next_index = node.subtree_end();
                continue;
            }
            if self.pattern >= self.query.pattern_count() {
                self.pattern = 0;
                self.next_index += 1;
                continue;
            }

            let pattern = self.pattern;
            self.pattern += 1;
            if index < self.exclusive_until[pattern] {
                continue;
            }
            match self.anchorer.anchor(pattern, node) {
                Ok(Some(bindings)) => {
                    if self.query.is_exclusive(pattern) {
                        self.exclusive_until[pattern] = node.subtree_end();
                    }
                    self.yielded += 1;
                    let captures = bindings
                        .into_iter()
                        .map(|(capture, node)| QueryCapture { index: capture, node: self.tree.node_at(node) })
                        .collect();
                    return Some(Ok(QueryMatch { query: self.query, pattern_index: pattern, anchor: node, captures }));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(
                        pattern,
                        node = %node.id(),
                        kind = node.kind(),
                        error = %err,
                        "match aborted"
                    );
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        self.done = true;
        None
    }
}
