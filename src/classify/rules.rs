use serde::{Deserialize, Serialize};

/// Which part of a text object a capture covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Around,
    Inside,
}

/// Category assigned by a rule. Flags and tags are filled in per match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCategory {
    TestCase,
    TestSuite,
    Runnable,
    OutlineItem,
    TextObject { object: String, scope: Scope },
    DocComment,
    Injection,
}

/// Maps one primary capture name to a category.
///
/// The optional attribute fields name other captures of the same match that
/// describe the primary one. Attribute captures are folded into the
/// classified capture instead of being emitted on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub capture: String,
    pub category: RuleCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl Rule {
    pub fn new(capture: &str, category: RuleCategory) -> Self {
        Rule { capture: capture.to_string(), category, name: None, context: None, focused: None, skipped: None }
    }

    pub fn with_name(mut self, capture: &str) -> Self {
        self.name = Some(capture.to_string());
        self
    }

    pub fn with_context(mut self, capture: &str) -> Self {
        self.context = Some(capture.to_string());
        self
    }

    /// Attribute captures `<capture>.name`, `<capture>.focused` and `<capture>.skipped`.
    pub fn with_test_attributes(mut self) -> Self {
        self.name = Some(format!("{}.name", self.capture));
        self.focused = Some(format!("{}.focused", self.capture));
        self.skipped = Some(format!("{}.skipped", self.capture));
        self
    }

    pub(crate) fn attributes(&self) -> impl Iterator<Item = &str> {
        [&self.name, &self.context, &self.focused, &self.skipped]
            .into_iter()
            .filter_map(|a| a.as_deref())
    }
}

fn default_helper_prefix() -> String {
    "_".to_string()
}

/// A complete rule set, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    pub rules: Vec<Rule>,
    /// Captures starting with this prefix are dropped.
    #[serde(default = "default_helper_prefix")]
    pub helper_prefix: String,
    /// Emit captures without a rule as `Other`.
    #[serde(default = "default_true")]
    pub keep_unmapped: bool,
}

fn default_true() -> bool {
    true
}

pub const TEXT_OBJECTS: [&str; 6] = ["class", "function", "comment", "block", "parameter", "test"];

impl Default for ClassifierRules {
    fn default() -> Self {
        let mut rules = vec![
            Rule::new("test.call", RuleCategory::TestCase).with_test_attributes(),
            Rule::new("test.suite", RuleCategory::TestSuite).with_test_attributes(),
            Rule::new("run", RuleCategory::Runnable).with_name("name"),
            Rule::new("item", RuleCategory::OutlineItem).with_name("name").with_context("context"),
            Rule::new("comment.doc", RuleCategory::DocComment),
            Rule::new("injection.content", RuleCategory::Injection).with_name("injection.language"),
        ];
        for object in TEXT_OBJECTS {
            for (suffix, scope) in [("around", Scope::Around), ("inside", Scope::Inside)] {
                rules.push(Rule::new(
                    &format!("{}.{}", object, suffix),
                    RuleCategory::TextObject { object: object.to_string(), scope },
                ));
            }
        }
        ClassifierRules { rules, helper_prefix: default_helper_prefix(), keep_unmapped: true }
    }
}
