//! Anchoring one pattern at one node.
//!
//! Recursion here follows the pattern's shape, never the tree's depth.
//! Backtracking is limited to candidate positions of child slots and
//! alternation branches; repetitions take a maximal run and are never split.

use crate::error::QueryError;
use crate::query::{FieldSlot, KindMatch, Matcher, NodeStep, Query, Sequence, Step, StepId};
use crate::tree::{Node, Tree};

type Result<T> = std::result::Result<T, QueryError>;

/// `(capture, node index)` pairs.
pub(crate) type Bindings = Vec<(u32, u32)>;

pub(crate) struct Anchorer<'t, 'q> {
    tree: &'t Tree,
    query: &'q Query,
    /// Traversal root; it anchors without its siblings.
    root: u32,
    kind_map: Vec<Option<u16>>,
    field_map: Vec<Option<u16>>,
    bindings: Bindings,
}

fn internal(msg: String) -> QueryError {
    QueryError::Internal(msg)
}

impl<'t, 'q> Anchorer<'t, 'q> {
    pub(crate) fn new(tree: &'t Tree, query: &'q Query, root: u32) -> Self {
        Anchorer {
            tree,
            query,
            root,
            kind_map: query.kinds.iter().map(|k| tree.kind_symbol(k)).collect(),
            field_map: query.fields.iter().map(|f| tree.field_symbol(f)).collect(),
            bindings: Vec::new(),
        }
    }

    /// Bindings sorted by node then capture, or `None` if the pattern does not match here.
    pub(crate) fn anchor(&mut self, pattern: usize, node: Node<'t>) -> Result<Option<Bindings>> {
        self.bindings.clear();
        let info = self
            .query
            .patterns
            .get(pattern)
            .ok_or_else(|| internal(format!("pattern {} out of range", pattern)))?;
        let root = info.root;
        let quantifier = self.step(root)?.quantifier;
        let only = [node.index()];
        let (siblings, pos): (&[u32], usize) = match node.parent() {
            Some(parent) if node.index() != self.root => (parent.child_ids(), node.sibling_index()),
            _ => (&only, 0),
        };

        if let Some(leading) = self.leading_repeat(root)? {
            if self.continues_run(leading, siblings, pos)? {
                return Ok(None);
            }
        }
        let end = if quantifier.repeats() {
            match self.match_item(root, siblings, pos)? {
                Some(end) => Some(self.extend_run(root, siblings, end)?),
                None => None,
            }
        } else {
            self.match_item(root, siblings, pos)?
        };

        Ok(end.map(|_| {
            let mut bindings = std::mem::take(&mut self.bindings);
            bindings.sort_unstable_by_key(|&(capture, node)| (node, capture));
            bindings.dedup();
            bindings
        }))
    }

    fn step(&self, id: StepId) -> Result<&'q Step> {
        self.query
            .steps
            .get(id)
            .ok_or_else(|| internal(format!("step {} out of range ({} steps)", id, self.query.steps.len())))
    }

    fn field_symbol(&self, field: usize) -> Result<Option<u16>> {
        self.field_map
            .get(field)
            .copied()
            .ok_or_else(|| internal(format!("field {} out of range", field)))
    }

    fn is_named(&self, index: u32) -> bool {
        self.tree.data(index).named
    }

    /// The repeated step a top-level pattern starts with: the root itself,
    /// or the first slot of a root group.
    fn leading_repeat(&self, root: StepId) -> Result<Option<StepId>> {
        let step = self.step(root)?;
        if step.quantifier.repeats() {
            return Ok(Some(root));
        }
        if let Matcher::Group(sequence) = &step.matcher {
            if let Some(first) = sequence.slots.first() {
                if self.step(first.step)?.quantifier.repeats() {
                    return Ok(Some(first.step));
                }
            }
        }
        Ok(None)
    }

    /// True when the sibling run containing `pos` starts earlier, so a
    /// repeated top-level pattern anchors only at the start of its run.
    fn continues_run(&mut self, step: StepId, siblings: &[u32], pos: usize) -> Result<bool> {
        let mark = self.bindings.len();
        let mut j = pos;
        while j > 0 {
            j -= 1;
            let matched = self.match_item(step, siblings, j)?.is_some();
            self.bindings.truncate(mark);
            if matched {
                return Ok(true);
            }
            if self.is_named(siblings[j]) {
                break;
            }
        }
        Ok(false)
    }

    /// Extend a repetition over following siblings, skipping anonymous nodes.
    fn extend_run(&mut self, step: StepId, children: &[u32], mut end: usize) -> Result<usize> {
        'run: loop {
            let mut j = end;
            while j < children.len() {
                if let Some(next) = self.match_item(step, children, j)? {
                    if next <= j {
                        break 'run;
                    }
                    end = next;
                    continue 'run;
                }
                if self.is_named(children[j]) {
                    break;
                }
                j += 1;
            }
            break;
        }
        Ok(end)
    }

    /// One repetition of `step` starting exactly at `children[pos]`.
    fn match_item(&mut self, id: StepId, children: &[u32], pos: usize) -> Result<Option<usize>> {
        if pos >= children.len() {
            return Ok(None);
        }
        let step = self.step(id)?;
        let mark = self.bindings.len();
        let end = match &step.matcher {
            Matcher::Node(node_step) => {
                if self.match_node(node_step, children[pos])? {
                    Some(pos + 1)
                } else {
                    None
                }
            }
            Matcher::Group(sequence) => self.match_sequence(sequence, 0, children, pos, true)?,
            Matcher::Alternation(branches) => {
                let mut found = None;
                for &branch in branches {
                    if let Some(end) = self.match_quantified_at(branch, children, pos)? {
                        found = Some(end);
                        break;
                    }
                }
                found
            }
        };

        let Some(end) = end else {
            self.bindings.truncate(mark);
            return Ok(None);
        };
        if end > pos {
            for &capture in &step.captures {
                if capture as usize >= self.query.capture_names.len() {
                    return Err(internal(format!("capture {} out of range", capture)));
                }
                self.bindings.push((capture, children[pos]));
            }
        }
        if !self.predicates_hold(step) {
            self.bindings.truncate(mark);
            return Ok(None);
        }
        Ok(Some(end))
    }

    /// `step` with its own quantifier applied, starting exactly at `pos`.
    fn match_quantified_at(&mut self, id: StepId, children: &[u32], pos: usize) -> Result<Option<usize>> {
        let quantifier = self.step(id)?.quantifier;
        match self.match_item(id, children, pos)? {
            Some(end) if quantifier.repeats() => Ok(Some(self.extend_run(id, children, end)?)),
            Some(end) => Ok(Some(end)),
            None if quantifier.allows_zero() => Ok(Some(pos)),
            None => Ok(None),
        }
    }

    fn match_node(&mut self, step: &'q NodeStep, index: u32) -> Result<bool> {
        let node = self.tree.node_at(index);
        if !self.kind_matches(&step.kind, node)? {
            return Ok(false);
        }
        for &field in &step.negated_fields {
            let symbol = self.field_symbol(field)?;
            if node.children_by_field_symbol(symbol).next().is_some() {
                return Ok(false);
            }
        }

        let mark = self.bindings.len();
        for slot in &step.fields {
            if !self.match_field(slot, node)? {
                self.bindings.truncate(mark);
                return Ok(false);
            }
        }
        if self.match_sequence(&step.children, 0, node.child_ids(), 0, false)?.is_none() {
            self.bindings.truncate(mark);
            return Ok(false);
        }
        Ok(true)
    }

    fn kind_matches(&self, kind: &KindMatch, node: Node<'t>) -> Result<bool> {
        let symbol = node.kind_symbol();
        let lookup = |k: usize| {
            self.kind_map
                .get(k)
                .copied()
                .ok_or_else(|| internal(format!("kind {} out of range", k)))
        };
        Ok(match kind {
            KindMatch::Any => true,
            KindMatch::AnyNamed => node.is_named(),
            KindMatch::Named(kinds) => {
                if !node.is_named() {
                    return Ok(false);
                }
                for &k in kinds {
                    if lookup(k)? == Some(symbol) {
                        return Ok(true);
                    }
                }
                false
            }
            KindMatch::Token(k) => !node.is_named() && lookup(*k)? == Some(symbol),
        })
    }

    fn match_field(&mut self, slot: &FieldSlot, node: Node<'t>) -> Result<bool> {
        let symbol = self.field_symbol(slot.field)?;
        let quantifier = self.step(slot.step)?.quantifier;
        let mut matched = 0;
        for child in node.children_by_field_symbol(symbol) {
            let one = [child.index()];
            if self.match_item(slot.step, &one, 0)?.is_some() {
                matched += 1;
                if !quantifier.repeats() {
                    break;
                }
            }
        }
        Ok(matched > 0 || quantifier.allows_zero())
    }

    /// Match slots `i..` of a sequence from `children[pos]`. With `pinned`,
    /// the first slot must match exactly at `pos`.
    fn match_sequence(
        &mut self,
        sequence: &'q Sequence,
        i: usize,
        children: &[u32],
        pos: usize,
        pinned: bool,
    ) -> Result<Option<usize>> {
        let Some(slot) = sequence.slots.get(i) else {
            if sequence.anchor_end && children[pos.min(children.len())..].iter().any(|&c| self.is_named(c)) {
                return Ok(None);
            }
            return Ok(Some(pos));
        };
        let quantifier = self.step(slot.step)?.quantifier;
        let mark = self.bindings.len();

        let mut j = pos;
        while j < children.len() {
            let mut next_j = j + 1;
            if let Some(end) = self.match_item(slot.step, children, j)? {
                let end = if quantifier.repeats() { self.extend_run(slot.step, children, end)? } else { end };
                if let Some(done) = self.match_sequence(sequence, i + 1, children, end, false)? {
                    return Ok(Some(done));
                }
                self.bindings.truncate(mark);
                if quantifier.repeats() {
                    // a later run must start after this one to stay maximal
                    next_j = end.max(j + 1);
                }
            }
            if pinned || (slot.anchored && self.is_named(children[j])) {
                break;
            }
            j = next_j;
        }

        if quantifier.allows_zero() {
            return self.match_sequence(sequence, i + 1, children, pos, pinned);
        }
        Ok(None)
    }

    fn predicates_hold(&self, step: &Step) -> bool {
        step.predicates.iter().all(|predicate| {
            predicate.evaluate(|capture| {
                self.bindings
                    .iter()
                    .filter(|(c, _)| *c == capture)
                    .map(|&(_, node)| self.tree.node_at(node).text())
                    .collect()
            })
        })
    }
}
