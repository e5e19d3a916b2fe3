use codequery::{languages, run_query, CaptureRecord, Language};
use std::fs;

fn captures(name: &str) -> Vec<CaptureRecord> {
    let source = fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
    run_query(&source, languages::ruby::DEBUGGER_QUERY, Language::Ruby).unwrap()
}

fn variables(records: &[CaptureRecord]) -> Vec<(usize, &str)> {
    records
        .iter()
        .filter(|r| r.name == "debug-variable")
        .map(|r| (r.line, r.text.as_str()))
        .collect()
}

#[test]
fn parameters_of_every_shape() {
    let records = captures("debugger.rb");
    let vars = variables(&records);
    let line_2: Vec<_> = vars.iter().filter(|(line, _)| *line == 2).map(|(_, text)| *text).collect();
    assert_eq!(line_2, vec!["customer", "total", "items", "meta"]);
    assert!(vars.contains(&(7, "line")));
    assert!(vars.contains(&(15, "entry")));
}

#[test]
fn assignments_and_instance_variables() {
    let records = captures("debugger.rb");
    let vars = variables(&records);
    for expected in [(3, "@customer"), (4, "@total"), (8, "subtotal"), (9, "subtotal"), (15, "@lines")] {
        assert!(vars.contains(&expected), "missing {:?} in {:?}", expected, vars);
    }
    assert_eq!(vars.iter().filter(|v| **v == (10, "@total")).count(), 2);
}

#[test]
fn receivers_and_arguments() {
    let records = captures("debugger.rb");
    let vars = variables(&records);
    assert!(vars.contains(&(8, "line")));
    assert!(vars.contains(&(11, "subtotal")));
    assert!(vars.contains(&(16, "entry")));
    for name in ["amount", "log", "tax", "each", "Invoice"] {
        assert!(vars.iter().all(|(_, text)| *text != name), "{} captured: {:?}", name, vars);
    }
}

#[test]
fn scopes_are_methods_and_blocks() {
    let records = captures("debugger.rb");
    let scopes: Vec<_> = records
        .iter()
        .filter(|r| r.name == "debug-scope")
        .map(|r| (r.line, r.text.lines().next().unwrap_or_default()))
        .collect();
    assert_eq!(
        scopes,
        vec![
            (2, "def initialize(customer, total = 0, *items, **meta)"),
            (7, "def add(line)"),
            (14, "def each_line"),
            (15, "do |entry|"),
        ]
    );
}
