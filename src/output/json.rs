use crate::error::QueryError;
use crate::FileReport;
use serde::Serialize;

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<FileOutput<'a>>,
}

#[derive(Serialize)]
struct FileOutput<'a> {
    path: &'a str,
    #[serde(flatten)]
    report: &'a FileReport,
}

/// Format reports as JSON
pub fn format_output(files: &[(String, FileReport)]) -> Result<String, QueryError> {
    let output = JsonOutput {
        files: files
            .iter()
            .map(|(path, report)| FileOutput { path, report })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::runnables::{Runnable, RunnableKind};
    use crate::CaptureRecord;

    #[test]
    fn json_captures_output() {
        let files = vec![(
            "card.rb".to_string(),
            FileReport::Captures(vec![CaptureRecord {
                name: "name".to_string(),
                line: 1,
                column: 5,
                text: "charge".to_string(),
            }]),
        )];
        let parsed: serde_json::Value = serde_json::from_str(&format_output(&files).unwrap()).unwrap();
        let file = &parsed["files"][0];
        assert_eq!(file["path"], "card.rb");
        assert_eq!(file["captures"][0]["name"], "name");
        assert_eq!(file["captures"][0]["line"], 1);
        assert_eq!(file["captures"][0]["text"], "charge");
    }

    #[test]
    fn json_runnables_output() {
        let files = vec![(
            "card_spec.rb".to_string(),
            FileReport::Runnables(vec![Runnable {
                kind: RunnableKind::TestCase,
                name: "validates card number".to_string(),
                tag: None,
                line: 2,
                focused: true,
                skipped: false,
                parents: vec![],
            }]),
        )];
        let parsed: serde_json::Value = serde_json::from_str(&format_output(&files).unwrap()).unwrap();
        let runnable = &parsed["files"][0]["runnables"][0];
        assert_eq!(runnable["kind"], "test_case");
        assert_eq!(runnable["focused"], true);
        assert!(runnable.get("parents").is_none());
    }

    #[test]
    fn json_empty_files() {
        let parsed: serde_json::Value = serde_json::from_str(&format_output(&[]).unwrap()).unwrap();
        assert_eq!(parsed["files"].as_array().unwrap().len(), 0);
    }
}
