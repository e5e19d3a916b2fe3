//! Query compilation.
//!
//! A query source is a forest of s-expression patterns. [`Query::new`] parses
//! it, resolves every node kind and field against a [`Schema`], and produces
//! an immutable step program shared by any number of match calls.

mod ast;
mod compile;
mod parser;
mod predicate;

pub(crate) use predicate::Predicate;

use crate::error::CompileError;
use crate::schema::Schema;

pub(crate) type StepId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    pub(crate) fn allows_zero(self) -> bool {
        matches!(self, Quantifier::ZeroOrOne | Quantifier::ZeroOrMore)
    }

    pub(crate) fn repeats(self) -> bool {
        matches!(self, Quantifier::ZeroOrMore | Quantifier::OneOrMore)
    }
}

/// A `#set!` directive attached to a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug)]
pub(crate) struct Step {
    pub matcher: Matcher,
    pub quantifier: Quantifier,
    pub captures: Vec<u32>,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Node(NodeStep),
    Alternation(Vec<StepId>),
    Group(Sequence),
}

#[derive(Debug)]
pub(crate) struct NodeStep {
    pub kind: KindMatch,
    pub fields: Vec<FieldSlot>,
    pub negated_fields: Vec<usize>,
    pub children: Sequence,
}

/// Indices point into [`Query::kinds`].
#[derive(Debug)]
pub(crate) enum KindMatch {
    Named(Vec<usize>),
    Token(usize),
    AnyNamed,
    Any,
}

#[derive(Debug)]
pub(crate) struct FieldSlot {
    /// Index into [`Query::fields`].
    pub field: usize,
    pub step: StepId,
}

/// Ordered child patterns. `anchored` slots must follow the previous slot
/// (or the start of the sequence) with only anonymous nodes in between.
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    pub slots: Vec<ChildSlot>,
    pub anchor_end: bool,
}

#[derive(Debug)]
pub(crate) struct ChildSlot {
    pub step: StepId,
    pub anchored: bool,
}

#[derive(Debug)]
pub(crate) struct PatternInfo {
    pub root: StepId,
    pub start_offset: usize,
    pub properties: Vec<Property>,
    pub exclusive: bool,
}

/// A compiled query: one or more top-level patterns.
#[derive(Debug)]
pub struct Query {
    pub(crate) steps: Vec<Step>,
    pub(crate) patterns: Vec<PatternInfo>,
    pub(crate) capture_names: Vec<String>,
    pub(crate) kinds: Vec<String>,
    pub(crate) fields: Vec<String>,
}

impl Query {
    pub fn new(source: &str, schema: &Schema) -> Result<Query, CompileError> {
        compile::compile(source, schema)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_index(&self, name: &str) -> Option<u32> {
        self.capture_names.iter().position(|n| n == name).map(|i| i as u32)
    }

    pub fn capture_name(&self, index: u32) -> Option<&str> {
        self.capture_names.get(index as usize).map(String::as_str)
    }

    /// `#set!` directives of a pattern, in source order.
    pub fn properties(&self, pattern: usize) -> &[Property] {
        self.patterns.get(pattern).map(|p| p.properties.as_slice()).unwrap_or(&[])
    }

    /// Value of a `#set!` key on a pattern. `Some(None)` for a key set without value.
    pub fn property(&self, pattern: usize, key: &str) -> Option<Option<&str>> {
        self.properties(pattern)
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_deref())
    }

    /// Byte offset of the pattern in the query source.
    pub fn start_offset(&self, pattern: usize) -> Option<usize> {
        self.patterns.get(pattern).map(|p| p.start_offset)
    }

    pub fn is_exclusive(&self, pattern: usize) -> bool {
        self.patterns.get(pattern).is_some_and(|p| p.exclusive)
    }
}

/// Compile `source` against `schema`.
pub fn compile(source: &str, schema: &Schema) -> Result<Query, CompileError> {
    Query::new(source, schema)
}
