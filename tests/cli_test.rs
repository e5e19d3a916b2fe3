use std::fs;
use tempfile::TempDir;

fn run_codequery(args: &[&str]) -> (String, String, bool) {
    let bin = env!("CARGO_BIN_EXE_codequery");
    let output = std::process::Command::new(bin)
        .args(args)
        .output()
        .expect("failed to run codequery");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (stdout, stderr, output.status.success())
}

fn run_ok(args: &[&str]) -> String {
    let (stdout, stderr, success) = run_codequery(args);
    assert!(success, "codequery failed: {}", stderr);
    stdout
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn query_file_prints_captures() {
    let dir = TempDir::new().unwrap();
    let query = write_file(&dir, "methods.scm", "(method name: (identifier) @name)\n");
    let source = write_file(&dir, "sum.rb", "def calculate_sum(a,b)\n  a + b\nend\n");
    let stdout = run_ok(&[&source, "--query", &query]);
    assert!(stdout.contains("1:5 | @name calculate_sum"), "{}", stdout);
}

#[test]
fn builtin_runnables_view() {
    let stdout = run_ok(&["tests/fixtures/card_spec.rb", "--builtin", "runnables", "--view", "runnables"]);
    assert!(stdout.contains("test validates card number (focused)"), "{}", stdout);
    assert!(stdout.contains("test declines expired cards (skipped)"), "{}", stdout);
}

#[test]
fn classify_flag_with_json() {
    let stdout = run_ok(&["tests/fixtures/card_spec.rb", "--builtin", "runnables", "--classify", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["files"][0]["classified"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn outline_view() {
    let stdout = run_ok(&["tests/fixtures/card.rb", "--builtin", "outline", "--view", "outline"]);
    assert!(stdout.contains("  class Card (L2)\n"), "{}", stdout);
    assert!(stdout.contains("      def test_card (L15)\n"), "{}", stdout);
}

#[test]
fn injections_builtin_classified() {
    let stdout = run_ok(&["tests/fixtures/injections.rb", "--builtin", "injections", "--classify"]);
    assert!(stdout.contains("injection [rbs]"), "{}", stdout);
    assert!(stdout.contains("injection [regex]"), "{}", stdout);
    assert!(stdout.contains("injection [sql]"), "{}", stdout);
}

#[test]
fn debugger_builtin_lists_variables() {
    let stdout = run_ok(&["tests/fixtures/debugger.rb", "--builtin", "debugger"]);
    assert!(stdout.contains("@debug-variable customer"), "{}", stdout);
    assert!(stdout.contains("@debug-scope def add(line)"), "{}", stdout);
}

#[test]
fn compile_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let query = write_file(&dir, "bad.scm", "(method\n  (identifer))");
    let (_, stderr, success) = run_codequery(&["tests/fixtures/card.rb", "--query", &query]);
    assert!(!success);
    assert!(stderr.contains("Error: Query error at 2:4"), "{}", stderr);
}

#[test]
fn unknown_builtin_exits_nonzero() {
    let (_, stderr, success) = run_codequery(&["tests/fixtures/card.rb", "--builtin", "highlights"]);
    assert!(!success);
    assert!(stderr.contains("Unknown built-in query: highlights"), "{}", stderr);
}

#[test]
fn lang_flag_overrides_detection() {
    let dir = TempDir::new().unwrap();
    let source = write_file(&dir, "Gemfile", "def source_url\nend\n");
    let query = write_file(&dir, "q.scm", "(method name: (_) @name)");
    let stdout = run_ok(&[&source, "--query", &query, "--lang", "ruby"]);
    assert!(stdout.contains("@name source_url"), "{}", stdout);
}

#[test]
fn query_or_builtin_is_required() {
    let (_, stderr, success) = run_codequery(&["tests/fixtures/card.rb"]);
    assert!(!success);
    assert!(stderr.contains("required arguments were not provided"), "{}", stderr);
    assert!(!stderr.contains("Invalid path"), "{}", stderr);
}

#[test]
fn query_and_builtin_conflict() {
    let (_, stderr, success) = run_codequery(&["tests/fixtures/card.rb", "--query", "q.scm", "--builtin", "outline"]);
    assert!(!success);
    assert!(stderr.contains("cannot be used with"), "{}", stderr);
}
