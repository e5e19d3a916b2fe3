use codequery::{process_path, Builtin, ClassifierRules, Language, OutputFormat, ProcessOptions, QueryError, QuerySource, View};
use std::fs;
use tempfile::TempDir;

const FIXTURE_DIR: &str = "tests/fixtures";

fn options(query: QuerySource, view: View) -> ProcessOptions {
    ProcessOptions { query, view, ..Default::default() }
}

#[test]
fn captures_for_a_single_file() {
    let output = process_path(
        "tests/fixtures/card.rb",
        options(QuerySource::Text("(method name: (_) @name)".to_string()), View::Captures),
    )
    .unwrap();
    assert!(output.starts_with("tests/fixtures/card.rb\n"));
    assert!(output.contains(" 5:7 | @name initialize"), "{}", output);
    assert!(output.contains("10:7 | @name valid?"), "{}", output);
}

#[test]
fn runnables_view_over_directory() {
    let output = process_path(FIXTURE_DIR, options(QuerySource::Builtin(Builtin::Runnables), View::Runnables)).unwrap();
    assert!(output.contains("test validates card number (focused) in Card > validation"), "{}", output);
    assert!(output.contains("task :build [rake-task]"), "{}", output);
    assert!(output.contains("suite CardTest"), "{}", output);
    assert!(output.contains("suite QuickCheckTest"), "{}", output);
    assert!(!output.contains("test_card"), "{}", output);
}

#[test]
fn outline_view_as_json() {
    let mut opts = options(QuerySource::Builtin(Builtin::Outline), View::Outline);
    opts.format = OutputFormat::Json;
    let output = process_path("tests/fixtures/card.rb", opts).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let outline = &parsed["files"][0]["outline"];
    assert_eq!(outline[0]["name"], "Card");
    assert_eq!(outline[0]["children"][0]["name"], ":number");
    assert_eq!(outline[0]["children"][2]["name"], "valid?");
    assert_eq!(outline[1]["name"], "Billing");
}

#[test]
fn classified_view_as_json() {
    let mut opts = options(QuerySource::Builtin(Builtin::Runnables), View::Classified);
    opts.format = OutputFormat::Json;
    let output = process_path("tests/fixtures/card_spec.rb", opts).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let classified = parsed["files"][0]["classified"].as_array().unwrap();
    let focused: Vec<_> = classified
        .iter()
        .filter(|c| c["category"]["type"] == "test_case" && c["category"]["focused"] == true)
        .collect();
    assert_eq!(focused.len(), 1);
    assert_eq!(focused[0]["name"], "validates card number");
    assert_eq!(focused[0]["ordinal_path"], serde_json::json!([0, 1, 0]));
}

#[test]
fn limit_applies_per_file() {
    let mut opts = options(QuerySource::Text("(identifier) @id".to_string()), View::Captures);
    opts.limit = Some(1);
    let output = process_path("tests/fixtures/card.rb", opts).unwrap();
    assert_eq!(output.lines().filter(|l| l.contains("@id")).count(), 1);
}

#[test]
fn custom_rules_rename_categories() {
    let rules: ClassifierRules = serde_json::from_str(
        r#"{"rules": [{"capture": "def", "category": {"type": "outline_item"}, "name": "name"}]}"#,
    )
    .unwrap();
    let mut opts = options(QuerySource::Text("(method name: (_) @name) @def".to_string()), View::Outline);
    opts.rules = Some(rules);
    let output = process_path("tests/fixtures/card.rb", opts).unwrap();
    assert!(output.contains("  initialize (L5)"), "{}", output);
}

#[test]
fn language_override_parses_unknown_extensions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Guardfile");
    fs::write(&path, "def watch\nend\n").unwrap();
    let mut opts = options(QuerySource::Text("(method name: (_) @name)".to_string()), View::Captures);
    opts.language = Some(Language::Ruby);
    let output = process_path(path.to_str().unwrap(), opts).unwrap();
    assert!(output.contains("@name watch"));
}

#[test]
fn directory_mode_skips_languages_without_builtin() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tasks.rake"), "task :build do\nend\n").unwrap();
    fs::write(dir.path().join("main.py"), "def main():\n    pass\n").unwrap();
    let output = process_path(
        dir.path().to_str().unwrap(),
        options(QuerySource::Builtin(Builtin::Runnables), View::Runnables),
    )
    .unwrap();
    assert!(output.contains("tasks.rake"));
    assert!(!output.contains("main.py"));
}

#[test]
fn directory_mode_rejects_bad_query() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.rb"), "x = 1\n").unwrap();
    let err = process_path(
        dir.path().to_str().unwrap(),
        options(QuerySource::Text("(method nmae: (identifier))".to_string()), View::Captures),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::Compile(_)));
}

#[test]
fn extension_filter_and_depth() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("lib/deep")).unwrap();
    fs::write(dir.path().join("top.rb"), "def top\nend\n").unwrap();
    fs::write(dir.path().join("lib/deep/inner.rb"), "def inner\nend\n").unwrap();
    fs::write(dir.path().join("tasks.rake"), "def rake_helper\nend\n").unwrap();
    let query = QuerySource::Text("(method name: (_) @name)".to_string());

    let mut opts = options(query.clone(), View::Captures);
    opts.ext = vec!["rb".to_string()];
    let output = process_path(dir.path().to_str().unwrap(), opts).unwrap();
    assert!(output.contains("@name top") && output.contains("@name inner"));
    assert!(!output.contains("rake_helper"));

    let mut opts = options(query, View::Captures);
    opts.depth = Some(0);
    let output = process_path(dir.path().to_str().unwrap(), opts).unwrap();
    assert!(output.contains("@name top") && output.contains("rake_helper"));
    assert!(!output.contains("inner"));
}

#[test]
fn missing_path_is_an_error() {
    let err = process_path("/nonexistent/card.rb", ProcessOptions::default()).unwrap_err();
    assert!(matches!(err, QueryError::PathNotFound(_)));
}
