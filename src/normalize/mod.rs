//! Format normalization into `{content, metadata}` units.

use crate::domain::{FileFormat, NormalizeStats, NormalizedUnit, RecordData, SanitizedItem};
use chrono::Utc;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod markdown;
pub mod repair;

pub use markdown::{split_sections, Section};
pub use repair::{repair_json, RepairOutcome};

/// Keys tried, in order, for a record's natural content.
const CONTENT_FIELDS: &[&str] = &["content", "text", "body", "message"];

/// Text shorter than this stays a single unit in the paragraph fallback.
const SHORT_TEXT_CHARS: usize = 200;

/// Keys the pipeline owns; record fields never override them.
const RESERVED_KEYS: &[&str] = &[
    "source",
    "original_format",
    "converted_at",
    "chunk_index",
    "total_chunks",
    "conversion_applied",
    "category",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("item did not pass sanitization")]
    NotSanitized,

    #[error("no content units produced")]
    NoUnits,
}

/// Convert one gated item into units. Failed items are rejected.
pub fn normalize(item: &SanitizedItem) -> Result<Vec<NormalizedUnit>, NormalizeError> {
    if !item.passed() {
        return Err(NormalizeError::NotSanitized);
    }
    let data = item.sanitized.as_ref().ok_or(NormalizeError::NotSanitized)?;
    let ctx = UnitContext::new(item);

    let drafts = match (item.preprocessed.format(), data) {
        (_, RecordData::Jsonl(entries)) => jsonl_units(entries),
        (_, RecordData::Json(value)) => json_units(value),
        (FileFormat::Markdown, RecordData::Text(text)) => markdown_units(text),
        (_, RecordData::Text(text)) => text_units(text),
    };
    let drafts: Vec<Draft> = drafts.into_iter().filter(|d| !d.content.trim().is_empty()).collect();
    if drafts.is_empty() {
        return Err(NormalizeError::NoUnits);
    }
    Ok(ctx.finish(drafts))
}

/// Normalize every item in parallel. Units line up with `items` by index;
/// items that did not pass sanitization map to an empty list.
pub fn normalize_all(items: &[SanitizedItem]) -> (Vec<Vec<NormalizedUnit>>, NormalizeStats) {
    let results: Vec<Option<Result<Vec<NormalizedUnit>, NormalizeError>>> = items
        .par_iter()
        .map(|item| item.passed().then(|| normalize(item)))
        .collect();

    let mut stats = NormalizeStats::default();
    let mut out = Vec::with_capacity(results.len());
    for (item, result) in items.iter().zip(results) {
        match result {
            None => out.push(Vec::new()),
            Some(Ok(units)) => {
                stats.processed += 1;
                stats.converted += 1;
                stats.units_created += units.len();
                if units.iter().any(|u| u.metadata.get("repaired") == Some(&Value::Bool(true))) {
                    stats.json_repaired += 1;
                }
                out.push(units);
            }
            Some(Err(err)) => {
                stats.processed += 1;
                stats.failed += 1;
                tracing::warn!(path = %item.file().path.display(), error = %err, "normalization failed");
                out.push(Vec::new());
            }
        }
    }
    (out, stats)
}

/// A unit before positional metadata is attached.
struct Draft {
    content: String,
    conversion: &'static str,
    extra: Map<String, Value>,
}

impl Draft {
    fn new(content: String, conversion: &'static str) -> Self {
        Self { content, conversion, extra: Map::new() }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

struct UnitContext {
    source: String,
    original_format: &'static str,
    category: String,
    converted_at: String,
}

impl UnitContext {
    fn new(item: &SanitizedItem) -> Self {
        let file = item.file();
        Self {
            source: file.relative_path.clone(),
            original_format: file.format.as_str(),
            category: file.category.as_str().to_string(),
            converted_at: Utc::now().to_rfc3339(),
        }
    }

    fn finish(&self, drafts: Vec<Draft>) -> Vec<NormalizedUnit> {
        let total = drafts.len();
        drafts
            .into_iter()
            .enumerate()
            .map(|(idx, draft)| {
                let mut metadata = Map::new();
                metadata.insert("source".into(), Value::String(self.source.clone()));
                metadata.insert("original_format".into(), Value::String(self.original_format.into()));
                metadata.insert("converted_at".into(), Value::String(self.converted_at.clone()));
                metadata.insert("chunk_index".into(), Value::from(idx));
                metadata.insert("total_chunks".into(), Value::from(total));
                metadata.insert("conversion_applied".into(), Value::String(draft.conversion.into()));
                metadata.insert("category".into(), Value::String(self.category.clone()));
                for (key, value) in draft.extra {
                    if !RESERVED_KEYS.contains(&key.as_str()) {
                        metadata.entry(key).or_insert(value);
                    }
                }
                NormalizedUnit { content: draft.content, metadata }
            })
            .collect()
    }
}

fn jsonl_units(entries: &[Map<String, Value>]) -> Vec<Draft> {
    entries.iter().map(|entry| record_draft(entry, "jsonl_passthrough", false)).collect()
}

fn json_units(value: &Value) -> Vec<Draft> {
    match value {
        Value::Array(items) => items.iter().map(json_element_draft).collect(),
        other => vec![Draft::new(pretty(other), "json_to_units")],
    }
}

fn markdown_units(text: &str) -> Vec<Draft> {
    split_sections(text)
        .into_iter()
        .map(|section| {
            let draft = Draft::new(section.content, "markdown_sections")
                .with("level", Value::from(section.level));
            match section.header {
                Some(header) => draft.with("header", Value::String(header)),
                None => draft,
            }
        })
        .collect()
}

/// Plain text: try JSON repair first, then fall back to paragraphs.
fn text_units(text: &str) -> Vec<Draft> {
    let outcome = repair_json(text);
    let Some(value) = outcome.value else {
        return paragraph_units(text);
    };

    let repaired = Value::Bool(!outcome.applied.is_empty());
    let applied = Value::from(outcome.applied.clone());
    let drafts = match &value {
        Value::Object(map) => vec![record_draft(map, "text_json_repair", true)],
        Value::Array(items) => items.iter().map(|v| element_draft(v, "text_json_repair")).collect(),
        other => vec![Draft::new(other.to_string(), "text_json_repair")],
    };
    drafts
        .into_iter()
        .map(|d| d.with("repaired", repaired.clone()).with("repairs_applied", applied.clone()))
        .collect()
}

fn paragraph_units(text: &str) -> Vec<Draft> {
    static BLANK_LINE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").expect("valid regex"));

    let trimmed = text.trim();
    if trimmed.chars().count() < SHORT_TEXT_CHARS {
        return vec![Draft::new(trimmed.to_string(), "text_single")];
    }
    BLANK_LINE
        .split(trimmed)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Draft::new(p.to_string(), "text_paragraphs"))
        .collect()
}

/// A mapping becomes a unit: its natural content field (if any) is the
/// content and the remaining fields become metadata. Without a content
/// field the whole mapping is the content.
fn record_draft(map: &Map<String, Value>, conversion: &'static str, pretty_print: bool) -> Draft {
    let content_field = CONTENT_FIELDS
        .iter()
        .find(|key| map.get(**key).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty()));

    match content_field {
        Some(field) => {
            let content = map.get(*field).and_then(Value::as_str).unwrap_or_default().to_string();
            let mut draft = Draft::new(content, conversion);
            for (key, value) in map {
                if key.as_str() != *field {
                    draft.extra.insert(key.clone(), value.clone());
                }
            }
            draft
        }
        None => {
            let whole = Value::Object(map.clone());
            let content = if pretty_print { pretty(&whole) } else { whole.to_string() };
            Draft::new(content, conversion)
        }
    }
}

fn element_draft(value: &Value, conversion: &'static str) -> Draft {
    match value {
        Value::Object(map) => record_draft(map, conversion, true),
        Value::String(s) => Draft::new(s.clone(), conversion),
        Value::Array(_) => Draft::new(pretty(value), conversion),
        other => Draft::new(other.to_string(), conversion),
    }
}

/// JSON file list elements keep their whole shape: mappings and nested
/// lists are pretty-printed, scalars stringified.
fn json_element_draft(value: &Value) -> Draft {
    match value {
        Value::String(s) => Draft::new(s.clone(), "json_to_units"),
        Value::Object(_) | Value::Array(_) => Draft::new(pretty(value), "json_to_units"),
        other => Draft::new(other.to_string(), "json_to_units"),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
