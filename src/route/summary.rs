//! Human-readable summaries of scan results for the knowledge side.

use super::shapes::FINDINGS_KEYS;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

const MAX_LISTED_FINDINGS: usize = 5;

/// Summarize a scan document: scanner, finding count, severity breakdown and
/// the first few findings. `None` when `value` is not an object.
pub fn summarize_scan(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let scanner = scanner_name(map).unwrap_or("unknown scanner");
    let findings: &[Value] = FINDINGS_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut severities: BTreeMap<String, usize> = BTreeMap::new();
    for finding in findings {
        let severity = finding
            .as_object()
            .and_then(|f| first_str(f, &["severity", "issue_severity", "level", "risk"]))
            .map_or_else(|| "UNKNOWN".to_string(), str::to_ascii_uppercase);
        *severities.entry(severity).or_insert(0) += 1;
    }

    let noun = if findings.len() == 1 { "finding" } else { "findings" };
    let mut out = format!("Scan summary ({scanner}): {} {noun}.", findings.len());
    if !severities.is_empty() {
        let breakdown: Vec<String> =
            severities.iter().map(|(severity, count)| format!("{severity} {count}")).collect();
        let _ = write!(out, " Severity: {}.", breakdown.join(", "));
    }
    for finding in findings.iter().take(MAX_LISTED_FINDINGS).filter_map(Value::as_object) {
        let _ = write!(out, "\n- {}", describe_finding(finding));
    }
    if findings.len() > MAX_LISTED_FINDINGS {
        let _ = write!(out, "\n- ... and {} more", findings.len() - MAX_LISTED_FINDINGS);
    }
    Some(out)
}

fn scanner_name(map: &Map<String, Value>) -> Option<&str> {
    map.get("metadata")
        .and_then(Value::as_object)
        .and_then(|meta| first_str(meta, &["scanner", "tool", "name"]))
        .or_else(|| first_str(map, &["scanner", "tool"]))
}

fn describe_finding(finding: &Map<String, Value>) -> String {
    let mut line = String::new();
    if let Some(severity) = first_str(finding, &["severity", "issue_severity", "level", "risk"]) {
        let _ = write!(line, "[{}] ", severity.to_ascii_uppercase());
    }
    let title = first_str(finding, &["title", "issue_text", "message", "description", "rule", "test_id"])
        .unwrap_or("untitled finding");
    line.push_str(title);
    if let Some(location) = first_str(finding, &["filename", "file", "path", "location"]) {
        let _ = write!(line, " ({location}");
        if let Some(n) = ["line_number", "line"].iter().find_map(|k| finding.get(*k).and_then(Value::as_u64)) {
            let _ = write!(line, ":{n}");
        }
        line.push(')');
    }
    line
}

fn first_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| map.get(*k).and_then(Value::as_str)).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_counts_findings_by_severity() {
        let scan = json!({
            "findings": [
                {"issue_severity": "HIGH", "issue_text": "Use of exec", "filename": "app.py", "line_number": 12},
                {"issue_severity": "low", "issue_text": "assert used"},
                {"issue_severity": "LOW", "test_id": "B101"}
            ],
            "metadata": {"scanner": "bandit"}
        });
        let summary = summarize_scan(&scan).unwrap();
        assert!(summary.starts_with("Scan summary (bandit): 3 findings. Severity: HIGH 1, LOW 2."));
        assert!(summary.contains("\n- [HIGH] Use of exec (app.py:12)"));
        assert!(summary.contains("\n- [LOW] B101"));
    }

    #[test]
    fn summary_handles_missing_metadata_and_long_lists() {
        let findings: Vec<Value> = (0..7).map(|i| json!({"message": format!("issue {i}")})).collect();
        let summary = summarize_scan(&json!({"results": findings})).unwrap();
        assert!(summary.starts_with("Scan summary (unknown scanner): 7 findings. Severity: UNKNOWN 7."));
        assert!(summary.ends_with("- ... and 2 more"));
        assert_eq!(summarize_scan(&json!([1, 2])), None);
    }
}
