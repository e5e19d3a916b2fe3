use crate::adapters::outline;
use crate::adapters::runnables::{Runnable, RunnableKind};
use crate::classify::{Category, Scope};
use crate::error::QueryError;
use crate::{CaptureRecord, ClassifiedRecord, FileReport};

/// Format reports as plain text: a header per file, then one line per entry
pub fn format_output(files: &[(String, FileReport)]) -> Result<String, QueryError> {
    let mut output = String::new();

    for (file_path, report) in files {
        if report.is_empty() {
            continue;
        }

        output.push_str(file_path);
        output.push('\n');
        match report {
            FileReport::Captures(records) => format_captures(records, &mut output),
            FileReport::Classified(records) => format_classified(records, &mut output),
            FileReport::Outline(nodes) => {
                for line in outline::render(nodes).lines() {
                    output.push_str("  ");
                    output.push_str(line);
                    output.push('\n');
                }
            }
            FileReport::Runnables(runnables) => format_runnables(runnables, &mut output),
        }
        output.push('\n');
    }

    Ok(output)
}

fn line_width<I: IntoIterator<Item = usize>>(lines: I) -> usize {
    lines.into_iter().max().unwrap_or(1).to_string().len()
}

/// First line of `text`, marked when more follows.
fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("");
    if lines.next().is_some() {
        format!("{} ...", first)
    } else {
        first.to_string()
    }
}

fn format_captures(records: &[CaptureRecord], output: &mut String) {
    let width = line_width(records.iter().map(|r| r.line));
    for record in records {
        output.push_str(&format!(
            "{:>width$}:{} | @{} {}\n",
            record.line,
            record.column,
            record.name,
            first_line(&record.text),
            width = width
        ));
    }
}

fn category_label(category: &Category) -> String {
    let flags = |focused: bool, skipped: bool| match (focused, skipped) {
        (true, _) => " (focused)",
        (false, true) => " (skipped)",
        _ => "",
    };
    match category {
        Category::TestCase { focused, skipped } => format!("test_case{}", flags(*focused, *skipped)),
        Category::TestSuite { focused, skipped } => format!("test_suite{}", flags(*focused, *skipped)),
        Category::Runnable { tag: Some(tag) } => format!("runnable [{}]", tag),
        Category::Runnable { tag: None } => "runnable".to_string(),
        Category::OutlineItem => "outline_item".to_string(),
        Category::TextObject { object, scope } => {
            let scope = match scope {
                Scope::Around => "around",
                Scope::Inside => "inside",
            };
            format!("textobject {}.{}", object, scope)
        }
        Category::DocComment => "doc_comment".to_string(),
        Category::Injection { language: Some(language) } => format!("injection [{}]", language),
        Category::Injection { language: None } => "injection".to_string(),
        Category::Other { capture } => format!("@{}", capture),
    }
}

fn format_classified(records: &[ClassifiedRecord], output: &mut String) {
    let width = line_width(records.iter().map(|r| r.line));
    for record in records {
        let label = match &record.name {
            Some(name) => name.clone(),
            None => first_line(&record.text),
        };
        output.push_str(&format!(
            "{:>width$}:{} | {} {:?} {}\n",
            record.line,
            record.column,
            category_label(&record.category),
            record.ordinal_path,
            label,
            width = width
        ));
    }
}

fn format_runnables(runnables: &[Runnable], output: &mut String) {
    let width = line_width(runnables.iter().map(|r| r.line));
    for runnable in runnables {
        let kind = match runnable.kind {
            RunnableKind::TestCase => "test",
            RunnableKind::TestSuite => "suite",
            RunnableKind::Task => "task",
        };
        let mut line = format!("{:>width$} | {} {}", runnable.line, kind, runnable.name, width = width);
        if let Some(tag) = &runnable.tag {
            line.push_str(&format!(" [{}]", tag));
        }
        if runnable.focused {
            line.push_str(" (focused)");
        } else if runnable.skipped {
            line.push_str(" (skipped)");
        }
        if !runnable.parents.is_empty() {
            line.push_str(&format!(" in {}", runnable.parents.join(" > ")));
        }
        output.push_str(&line);
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(name: &str, line: usize, column: usize, text: &str) -> CaptureRecord {
        CaptureRecord { name: name.to_string(), line, column, text: text.to_string() }
    }

    #[test]
    fn captures_are_aligned_by_line_width() {
        let files = vec![(
            "card.rb".to_string(),
            FileReport::Captures(vec![capture("name", 3, 5, "valid?"), capture("name", 12, 5, "charge")]),
        )];
        let out = format_output(&files).unwrap();
        assert_eq!(out, "card.rb\n 3:5 | @name valid?\n12:5 | @name charge\n\n");
    }

    #[test]
    fn multiline_text_is_shortened() {
        assert_eq!(first_line("def a\n  1\nend"), "def a ...");
        assert_eq!(first_line("one"), "one");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn empty_reports_are_skipped() {
        let files = vec![
            ("empty.rb".to_string(), FileReport::Captures(vec![])),
            ("other.rb".to_string(), FileReport::Runnables(vec![])),
        ];
        assert_eq!(format_output(&files).unwrap(), "");
    }

    #[test]
    fn classified_lines_show_category_and_path() {
        let record = ClassifiedRecord {
            category: Category::TestCase { focused: true, skipped: false },
            capture: "test.call".to_string(),
            name: Some("validates card number".to_string()),
            line: 2,
            column: 3,
            end_line: 3,
            ordinal_path: vec![0, 0],
            text: "fit \"validates card number\" do\n  end".to_string(),
        };
        let out = format_output(&[("card_spec.rb".to_string(), FileReport::Classified(vec![record]))]).unwrap();
        assert!(out.contains("2:3 | test_case (focused) [0, 0] validates card number"));
    }

    #[test]
    fn runnables_show_flags_and_parents() {
        let runnable = Runnable {
            kind: RunnableKind::TestCase,
            name: "declines expired cards".to_string(),
            tag: None,
            line: 9,
            focused: false,
            skipped: true,
            parents: vec!["Card".to_string(), "#charge".to_string()],
        };
        let out = format_output(&[("card_spec.rb".to_string(), FileReport::Runnables(vec![runnable]))]).unwrap();
        assert!(out.contains("9 | test declines expired cards (skipped) in Card > #charge"));
    }

    #[test]
    fn category_labels() {
        assert_eq!(category_label(&Category::Runnable { tag: Some("rake-task".into()) }), "runnable [rake-task]");
        assert_eq!(
            category_label(&Category::TextObject { object: "function".into(), scope: Scope::Inside }),
            "textobject function.inside"
        );
        assert_eq!(category_label(&Category::Other { capture: "call".into() }), "@call");
    }
}
