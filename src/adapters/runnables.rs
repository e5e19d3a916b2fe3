use super::label;
use crate::classify::{Category, ClassifiedCapture};
use crate::error::QueryError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnableKind {
    TestCase,
    TestSuite,
    Task,
}

/// Something a test runner can execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Runnable {
    pub kind: RunnableKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// 1-based.
    pub line: usize,
    pub focused: bool,
    pub skipped: bool,
    /// Names of the enclosing suites, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Collect test cases, test suites and tagged runnables from a classified stream.
pub fn detect<'t, I>(captures: I) -> Result<Vec<Runnable>, QueryError>
where
    I: IntoIterator<Item = Result<ClassifiedCapture<'t>, QueryError>>,
{
    let mut found = Vec::new();
    // (ordinal path, name) of the suites seen so far
    let mut suites: Vec<(Vec<usize>, String)> = Vec::new();
    for capture in captures {
        let capture = capture?;
        let (kind, tag, focused, skipped) = match &capture.category {
            Category::TestCase { focused, skipped } => (RunnableKind::TestCase, None, *focused, *skipped),
            Category::TestSuite { focused, skipped } => (RunnableKind::TestSuite, None, *focused, *skipped),
            Category::Runnable { tag } => (RunnableKind::Task, tag.clone(), false, false),
            _ => continue,
        };
        let name = label(&capture);
        let path = &capture.ordinal_path;
        let parents = if kind == RunnableKind::Task {
            Vec::new()
        } else {
            suites
                .iter()
                .filter(|(suite, _)| suite.len() < path.len() && path.starts_with(suite))
                .map(|(_, name)| name.clone())
                .collect()
        };
        if kind == RunnableKind::TestSuite {
            suites.push((path.clone(), name.clone()));
        }
        found.push(Runnable {
            kind,
            name,
            tag,
            line: capture.range.start.row + 1,
            focused,
            skipped,
            parents,
        });
    }
    Ok(found)
}

/// Whether any runnable is focused; runners then execute only focused ones.
pub fn has_focus(runnables: &[Runnable]) -> bool {
    runnables.iter().any(|r| r.focused)
}
