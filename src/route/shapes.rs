//! Content-shape heuristics used by the routing table.

use crate::domain::RecordData;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Keys holding a list of scan findings, in lookup order.
pub const FINDINGS_KEYS: &[&str] = &["findings", "issues", "vulnerabilities", "results"];

const PEOPLE_KEYS: &[&str] = &["name", "email", "company", "contact", "person", "client", "phone"];
const REPORT_KEYS: &[&str] = &["report", "assessment", "audit", "compliance", "summary"];

static PEOPLE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:contact|e-?mail|phone|tel)\b\s*[:#]|\[EMAIL_REDACTED\]|\+?\d{1,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
    )
    .expect("valid regex")
});

static REPORT_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:report|assessment|audit|compliance|executive summary)\b")
        .expect("valid regex")
});

/// An object with a findings- or results-like key.
pub fn is_scan_shaped(data: &RecordData) -> bool {
    match data {
        RecordData::Json(Value::Object(map)) => FINDINGS_KEYS.iter().any(|k| map.contains_key(*k)),
        _ => false,
    }
}

pub fn is_people_shaped(data: &RecordData) -> bool {
    match data {
        RecordData::Text(text) => PEOPLE_TEXT.is_match(text),
        _ => structured_maps(data).any(|map| has_key_token(map, PEOPLE_KEYS)),
    }
}

pub fn is_report_shaped(data: &RecordData) -> bool {
    match data {
        RecordData::Text(text) => REPORT_TEXT.is_match(text),
        _ => structured_maps(data).any(|map| has_key_token(map, REPORT_KEYS)),
    }
}

/// Top-level mappings of structured data: the object itself, array elements,
/// or JSONL entries.
fn structured_maps(data: &RecordData) -> Box<dyn Iterator<Item = &Map<String, Value>> + '_> {
    match data {
        RecordData::Jsonl(entries) => Box::new(entries.iter()),
        RecordData::Json(Value::Object(map)) => Box::new(std::iter::once(map)),
        RecordData::Json(Value::Array(items)) => Box::new(items.iter().filter_map(Value::as_object)),
        _ => Box::new(std::iter::empty()),
    }
}

/// True when any key, split on `_`/`-`/space, contains one of `tokens`.
fn has_key_token(map: &Map<String, Value>, tokens: &[&str]) -> bool {
    map.keys().any(|key| {
        key.to_ascii_lowercase()
            .split(['_', '-', ' '])
            .any(|part| tokens.contains(&part))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_shape_needs_findings_like_key() {
        assert!(is_scan_shaped(&RecordData::Json(json!({"findings": [], "metadata": {}}))));
        assert!(is_scan_shaped(&RecordData::Json(json!({"results": []}))));
        assert!(!is_scan_shaped(&RecordData::Json(json!({"metadata": {"scanner": "x"}}))));
        assert!(!is_scan_shaped(&RecordData::Text("findings".into())));
    }

    #[test]
    fn people_shape_from_keys_or_text() {
        assert!(is_people_shaped(&RecordData::Json(json!({"client_name": "Acme", "notes": ""}))));
        assert!(is_people_shaped(&RecordData::Json(json!([{"email": "x"}]))));
        assert!(is_people_shaped(&RecordData::Text("Phone: 555-123-4567".into())));
        assert!(is_people_shaped(&RecordData::Text("reach [EMAIL_REDACTED] today".into())));
        assert!(!is_people_shaped(&RecordData::Text("Quarterly audit of the network.".into())));
    }

    #[test]
    fn report_shape_from_keys_or_text() {
        assert!(is_report_shaped(&RecordData::Json(json!({"audit_date": "2024-01-01"}))));
        assert!(is_report_shaped(&RecordData::Text("Compliance review for Q3".into())));
        assert!(!is_report_shaped(&RecordData::Text("kickoff call went well".into())));
    }
}
