//! Report JSON generation.

use crate::archive::CleanupOutcome;
use crate::domain::{RoutedItem, RunStats};
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

pub fn write_report(
    report_path: &Path,
    stats: &RunStats,
    items: &[RoutedItem],
    cleanup: &[CleanupOutcome],
    output_files: &[String],
    config: &Value,
    include_timestamp: bool,
) -> Result<()> {
    let mut sorted_output_files = output_files.to_vec();
    sorted_output_files.sort();

    let outcomes: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| item_outcome(item, cleanup.get(idx)))
        .collect();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("stats".to_string(), stats.to_report_value());
    report.insert("config".to_string(), config.clone());
    report.insert("output_files".to_string(), serde_json::to_value(sorted_output_files)?);
    report.insert("items".to_string(), Value::Array(outcomes));

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}

/// Every stage's decision for one source file.
fn item_outcome(item: &RoutedItem, cleanup: Option<&CleanupOutcome>) -> Value {
    let pre = &item.sanitized.preprocessed;
    let gate = &item.sanitized;
    json!({
        "source": pre.file.relative_path,
        "category": pre.file.category.as_str(),
        "format": pre.file.format.as_str(),
        "preprocess": {"valid": pre.valid, "error": pre.error},
        "sanitize": {
            "quality_gate": gate.quality_gate.as_str(),
            "issues_found": gate.issues_found,
            "issues_fixed": gate.issues_fixed,
            "duplicate": gate.duplicate,
            "content_hash": gate.content_hash,
        },
        "units": item.units.len(),
        "route": item.route,
        "cleanup": cleanup,
    })
}

#[cfg(test)]
mod tests {
    use super::write_report;
    use crate::archive::CleanupOutcome;
    use crate::domain::{
        Category, FileFormat, PreprocessedItem, QualityGate, RawFile, RecordData, RouteDecision,
        RoutedItem, RunStats, SanitizedItem,
    };
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn report_lists_each_item_with_its_decisions() {
        let tmp = TempDir::new().expect("tmp");
        let report_path = tmp.path().join("report.json");
        let file = RawFile {
            path: PathBuf::from("/in/sessions/dup.md"),
            relative_path: "dup.md".to_string(),
            category: Category::Sessions,
            format: FileFormat::Markdown,
        };
        let item = RoutedItem {
            sanitized: SanitizedItem {
                preprocessed: PreprocessedItem::valid(file, RecordData::Text("x".into())),
                sanitized: None,
                quality_gate: QualityGate::Fail,
                issues_found: vec!["duplicate_content".into()],
                issues_fixed: Vec::new(),
                duplicate: true,
                content_hash: Some("abc".into()),
            },
            units: Vec::new(),
            route: RouteDecision::skip("failed sanitization: duplicate content"),
        };
        let mut stats = RunStats::default();
        stats.sanitize.duplicates = 1;

        write_report(
            &report_path,
            &stats,
            &[item],
            &[CleanupOutcome::Skipped { reason: "failed sanitization: duplicate content".into() }],
            &["rag.jsonl".to_string(), "report.json".to_string(), "sql.jsonl".to_string()],
            &json!({"dry_run": false}),
            false,
        )
        .expect("write report");

        let content = fs::read_to_string(report_path).expect("read report");
        let parsed: serde_json::Value = serde_json::from_str(&content).expect("json");
        assert!(parsed.get("generated_at").is_none());
        assert_eq!(parsed["stats"]["sanitize"]["duplicates"], json!(1));
        assert_eq!(parsed["output_files"][0], "rag.jsonl");
        let item = &parsed["items"][0];
        assert_eq!(item["sanitize"]["quality_gate"], "FAIL");
        assert_eq!(item["sanitize"]["duplicate"], true);
        assert_eq!(item["route"]["destination"], "SKIP");
        assert_eq!(item["cleanup"]["status"], "skipped");
    }
}
