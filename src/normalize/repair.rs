//! JSON repair for almost-valid model output.
//!
//! The cascade tries the text as-is, then each technique alone, then all
//! techniques chained. Only a parsed object or array counts as success.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub const REMOVED_MARKDOWN_JSON_BLOCK: &str = "removed_markdown_json_block";
pub const FIXED_DOUBLE_ESCAPING: &str = "fixed_double_escaping";
pub const REMOVED_TRAILING_COMMAS: &str = "removed_trailing_commas";

/// A pure text rewrite with a stable name.
pub struct RepairTechnique {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Techniques in cascade order.
pub static TECHNIQUES: &[RepairTechnique] = &[
    RepairTechnique { name: REMOVED_MARKDOWN_JSON_BLOCK, apply: strip_code_fence },
    RepairTechnique { name: FIXED_DOUBLE_ESCAPING, apply: collapse_double_escapes },
    RepairTechnique { name: REMOVED_TRAILING_COMMAS, apply: strip_trailing_commas },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub value: Option<Value>,
    /// Techniques that changed the text on the successful attempt.
    pub applied: Vec<&'static str>,
}

impl RepairOutcome {
    fn parsed(value: Value, applied: Vec<&'static str>) -> Self {
        Self { value: Some(value), applied }
    }

    fn failed() -> Self {
        Self { value: None, applied: Vec::new() }
    }

    pub fn repaired(&self) -> bool {
        self.value.is_some() && !self.applied.is_empty()
    }
}

pub fn repair_json(text: &str) -> RepairOutcome {
    if let Some(value) = parse_container(text) {
        return RepairOutcome::parsed(value, Vec::new());
    }

    for technique in TECHNIQUES {
        let candidate = (technique.apply)(text);
        if candidate == text {
            continue;
        }
        if let Some(value) = parse_container(&candidate) {
            return RepairOutcome::parsed(value, vec![technique.name]);
        }
    }

    let mut combined = text.to_string();
    let mut applied = Vec::new();
    for technique in TECHNIQUES {
        let next = (technique.apply)(&combined);
        if next != combined {
            applied.push(technique.name);
            combined = next;
        }
    }
    if applied.len() > 1 {
        if let Some(value) = parse_container(&combined) {
            return RepairOutcome::parsed(value, applied);
        }
    }

    RepairOutcome::failed()
}

fn parse_container(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

pub fn strip_code_fence(text: &str) -> String {
    static FENCE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)^\s*```(?i:json)?[ \t]*\r?\n?(.*?)\r?\n?\s*```\s*$").expect("valid regex")
    });
    match FENCE.captures(text) {
        Some(caps) => caps.get(1).map_or_else(String::new, |m| m.as_str().to_string()),
        None => text.to_string(),
    }
}

pub fn collapse_double_escapes(text: &str) -> String {
    text.replace("\\\\n", "\\n").replace("\\\\\"", "\\\"").replace("\\\\t", "\\t")
}

pub fn strip_trailing_commas(text: &str) -> String {
    static TRAILING: Lazy<Regex> =
        Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
    TRAILING.replace_all(text, "$1").into_owned()
}
