//! Capture classification.
//!
//! Raw capture names are engine-level labels. A [`Classifier`] maps them to
//! semantic [`Category`] values for outline, textobject and runnable consumers,
//! folding attribute captures (a test's name, its focus marker) into the
//! capture they describe.

mod rules;

pub use rules::{ClassifierRules, Rule, RuleCategory, Scope, TEXT_OBJECTS};

use crate::engine::QueryMatch;
use crate::error::QueryError;
use crate::tree::{Node, TextRange};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Category {
    TestCase { focused: bool, skipped: bool },
    TestSuite { focused: bool, skipped: bool },
    Runnable { tag: Option<String> },
    OutlineItem,
    TextObject { object: String, scope: Scope },
    DocComment,
    /// Text embedded in another language, lowercased language name if known.
    Injection { language: Option<String> },
    Other { capture: String },
}

impl Category {
    /// Captures of one family share an ordinal numbering.
    fn family(&self) -> String {
        match self {
            Category::TestCase { .. } | Category::TestSuite { .. } => "test".to_string(),
            Category::Runnable { .. } => "run".to_string(),
            Category::OutlineItem => "outline".to_string(),
            Category::TextObject { object, .. } => format!("textobject.{}", object),
            Category::DocComment => "doc".to_string(),
            Category::Injection { .. } => "injection".to_string(),
            Category::Other { capture } => format!("other.{}", capture),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCapture<'t> {
    pub category: Category,
    /// Raw capture name the category came from.
    pub capture: String,
    /// First node bound to the capture.
    pub node: Node<'t>,
    /// Span of every node the capture bound in this match, so a comment run
    /// is one capture.
    pub range: TextRange,
    pub text: &'t str,
    /// Text of the rule's name capture, if bound.
    pub name: Option<&'t str>,
    /// Texts of the rule's context captures.
    pub context: Vec<&'t str>,
    /// Position among enclosing captures of the same family, outermost first.
    pub ordinal_path: Vec<usize>,
    pub pattern_index: usize,
}

pub struct Classifier {
    rules: ClassifierRules,
    by_capture: HashMap<String, usize>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(ClassifierRules::default())
    }
}

impl Classifier {
    pub fn new(rules: ClassifierRules) -> Self {
        let mut by_capture = HashMap::new();
        for (i, rule) in rules.rules.iter().enumerate() {
            by_capture.entry(rule.capture.clone()).or_insert(i);
        }
        Classifier { rules, by_capture }
    }

    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        let rules: ClassifierRules = serde_json::from_str(json)?;
        Ok(Classifier::new(rules))
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify a match stream lazily. The result ends after the first error.
    pub fn classify<'c, 't, 'q, I>(&'c self, matches: I) -> Classified<'c, 't, I>
    where
        I: Iterator<Item = Result<QueryMatch<'t, 'q>, QueryError>>,
    {
        Classified { classifier: self, matches, pending: VecDeque::new(), families: BTreeMap::new(), done: false }
    }

    /// Captures of one match in capture order, without ordinal paths.
    pub fn classify_match<'t>(&self, m: &QueryMatch<'t, '_>) -> Vec<ClassifiedCapture<'t>> {
        let primaries: Vec<&Rule> = m
            .captures()
            .iter()
            .filter_map(|c| self.rule_for(m.capture_name(c)))
            .collect();
        let is_attribute = |name: &str| primaries.iter().any(|rule| rule.attributes().any(|a| a == name));
        let has = |capture: &Option<String>| capture.as_deref().is_some_and(|name| m.first(name).is_some());
        let focused_property = m.property("focused").is_some();
        let skipped_property = m.property("skipped").is_some();

        let mut out: Vec<ClassifiedCapture<'t>> = Vec::new();
        // capture name -> position in `out`, for merging later nodes of a rule capture
        let mut merged: HashMap<&str, usize> = HashMap::new();
        for capture in m.captures() {
            let name = m.capture_name(capture);
            if !self.rules.helper_prefix.is_empty() && name.starts_with(self.rules.helper_prefix.as_str()) {
                continue;
            }
            if let Some(&i) = merged.get(name) {
                extend(&mut out[i], capture.node);
                continue;
            }
            let category = match self.rule_for(name) {
                Some(rule) => {
                    let focused = focused_property || has(&rule.focused);
                    let skipped = skipped_property || has(&rule.skipped);
                    match &rule.category {
                        RuleCategory::TestCase => Category::TestCase { focused, skipped },
                        RuleCategory::TestSuite => Category::TestSuite { focused, skipped },
                        RuleCategory::Runnable => Category::Runnable {
                            tag: m.property("tag").flatten().map(str::to_string),
                        },
                        RuleCategory::OutlineItem => Category::OutlineItem,
                        RuleCategory::TextObject { object, scope } => {
                            Category::TextObject { object: object.clone(), scope: *scope }
                        }
                        RuleCategory::DocComment => Category::DocComment,
                        // from `#set! injection.language`, else the text of the name capture
                        RuleCategory::Injection => Category::Injection {
                            language: m
                                .property("injection.language")
                                .flatten()
                                .map(str::to_lowercase)
                                .or_else(|| {
                                    let node = rule.name.as_deref().and_then(|a| m.first(a))?;
                                    Some(node.text().trim().to_lowercase())
                                }),
                        },
                    }
                }
                None if is_attribute(name) || !self.rules.keep_unmapped => continue,
                None => Category::Other { capture: name.to_string() },
            };
            let rule = self.rule_for(name);
            if rule.is_some() {
                merged.insert(name, out.len());
            }
            let attribute_text = |attr: Option<&Option<String>>| {
                attr.and_then(|a| a.as_deref())
                    .and_then(|a| m.first(a))
                    .map(|n| n.text())
            };
            out.push(ClassifiedCapture {
                category,
                capture: name.to_string(),
                node: capture.node,
                range: capture.node.range(),
                text: capture.node.text(),
                name: attribute_text(rule.map(|r| &r.name)),
                context: rule
                    .and_then(|r| r.context.as_deref())
                    .map(|a| m.nodes_for(a).map(|n| n.text()).collect())
                    .unwrap_or_default(),
                ordinal_path: Vec::new(),
                pattern_index: m.pattern_index(),
            });
        }
        out
    }

    fn rule_for(&self, capture: &str) -> Option<&Rule> {
        self.by_capture.get(capture).map(|&i| &self.rules.rules[i])
    }
}

/// Grow `capture` to cover `node` too, re-slicing its text from the source.
fn extend<'t>(capture: &mut ClassifiedCapture<'t>, node: Node<'t>) {
    let range = node.range();
    if range.start_byte < capture.range.start_byte {
        capture.range.start_byte = range.start_byte;
        capture.range.start = range.start;
    }
    if range.end_byte > capture.range.end_byte {
        capture.range.end_byte = range.end_byte;
        capture.range.end = range.end;
    }
    let source = node.tree().source();
    capture.text = source.get(capture.range.start_byte..capture.range.end_byte).unwrap_or(capture.text);
}

struct Level {
    start: usize,
    end: usize,
    capture: String,
    path: Vec<usize>,
    children: usize,
}

/// Containment stack of one category family.
#[derive(Default)]
struct Family {
    levels: Vec<Level>,
    roots: usize,
}

impl Family {
    /// Drop the levels that do not contain `start..end`.
    fn close(&mut self, start: usize, end: usize) {
        while let Some(top) = self.levels.last() {
            if top.start <= start && end <= top.end {
                break;
            }
            self.levels.pop();
        }
    }

    /// Whether an open capture named `capture` contains `start..end`.
    fn within(&mut self, capture: &str, start: usize, end: usize) -> bool {
        self.close(start, end);
        self.levels.iter().any(|level| level.capture == capture)
    }

    /// Whether the innermost open capture spans exactly `start..end`.
    fn repeats(&mut self, start: usize, end: usize) -> bool {
        self.close(start, end);
        self.levels.last().is_some_and(|top| top.start == start && top.end == end)
    }

    fn place(&mut self, start: usize, end: usize, capture: &str) -> Vec<usize> {
        self.close(start, end);
        let (mut path, ordinal) = match self.levels.last_mut() {
            Some(top) => {
                top.children += 1;
                (top.path.clone(), top.children - 1)
            }
            None => {
                self.roots += 1;
                (Vec::new(), self.roots - 1)
            }
        };
        path.push(ordinal);
        self.levels.push(Level { start, end, capture: capture.to_string(), path: path.clone(), children: 0 });
        path
    }
}

/// Lazy classified capture stream, in match order then capture order.
///
/// A capture spanning exactly the innermost open capture of its family is a
/// duplicate and skipped. A match whose pattern sets `within <capture>` is
/// kept only inside an open capture of that name.
pub struct Classified<'c, 't, I> {
    classifier: &'c Classifier,
    matches: I,
    pending: VecDeque<ClassifiedCapture<'t>>,
    families: BTreeMap<String, Family>,
    done: bool,
}

impl<'c, 't, 'q, I> Iterator for Classified<'c, 't, I>
where
    I: Iterator<Item = Result<QueryMatch<'t, 'q>, QueryError>>,
{
    type Item = Result<ClassifiedCapture<'t>, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(capture) = self.pending.pop_front() {
                return Some(Ok(capture));
            }
            if self.done {
                return None;
            }
            match self.matches.next() {
                Some(Ok(m)) => {
                    let within = m.property("within").flatten();
                    for mut capture in self.classifier.classify_match(&m) {
                        let (start, end) = (capture.range.start_byte, capture.range.end_byte);
                        let family = self.families.entry(capture.category.family()).or_default();
                        if family.repeats(start, end) {
                            continue;
                        }
                        if within.is_some_and(|outer| !family.within(outer, start, end)) {
                            continue;
                        }
                        capture.ordinal_path = family.place(start, end, &capture.capture);
                        self.pending.push_back(capture);
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
