//! Format-specific parsing and structural validation.
//!
//! Every failure becomes an invalid `PreprocessedItem`; nothing here aborts a run.

use crate::domain::{Category, FileFormat, PreprocessStats, PreprocessedItem, RawFile, RecordData};
use crate::utils::decode_lenient;
use rayon::prelude::*;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys that make a scan/sync JSON document acceptable.
const SCAN_KEYS: &[&str] = &["findings", "issues", "vulnerabilities", "results", "metadata"];

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("line {line}: invalid JSON: {message}")]
    JsonlSyntax { line: usize, message: String },

    #[error("line {line}: {reason}")]
    JsonlEntry { line: usize, reason: &'static str },

    #[error("invalid JSON: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    #[error("scan/sync JSON lacks a findings, results or metadata key")]
    NotScanShaped,

    #[error("JSONL file has no entries")]
    EmptyJsonl,

    #[error("file is empty after stripping whitespace")]
    EmptyText,
}

/// Parse a single discovered file.
pub fn preprocess(file: RawFile) -> PreprocessedItem {
    let bytes = match std::fs::read(&file.path) {
        Ok(b) => b,
        Err(err) => return PreprocessedItem::invalid(file, None, PreprocessError::from(err).to_string()),
    };
    let (text, _encoding) = decode_lenient(&bytes);

    let parsed = match file.format {
        FileFormat::Jsonl => parse_jsonl(&text).map(RecordData::Jsonl),
        FileFormat::Json => parse_json(&text, &file.category).map(RecordData::Json),
        FileFormat::Markdown | FileFormat::Text => {
            if text.trim().is_empty() {
                return PreprocessedItem::invalid(
                    file,
                    Some(RecordData::Text(text)),
                    PreprocessError::EmptyText.to_string(),
                );
            }
            Ok(RecordData::Text(text))
        }
    };

    match parsed {
        Ok(data) => PreprocessedItem::valid(file, data),
        Err(err) => {
            tracing::debug!(path = %file.path.display(), error = %err, "preprocessing rejected file");
            PreprocessedItem::invalid(file, None, err.to_string())
        }
    }
}

/// Parse every file in parallel, keeping input order.
pub fn preprocess_all(files: Vec<RawFile>) -> (Vec<PreprocessedItem>, PreprocessStats) {
    let items: Vec<PreprocessedItem> = files.into_par_iter().map(preprocess).collect();
    let mut stats = PreprocessStats { processed: items.len(), ..PreprocessStats::default() };
    for item in &items {
        if item.valid {
            stats.valid += 1;
        } else {
            stats.invalid += 1;
        }
    }
    (items, stats)
}

fn parse_jsonl(text: &str) -> Result<Vec<Map<String, Value>>, PreprocessError> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| PreprocessError::JsonlSyntax { line: line_no, message: e.to_string() })?;
        let Value::Object(map) = value else {
            return Err(PreprocessError::JsonlEntry {
                line: line_no,
                reason: "entry is not a JSON object",
            });
        };
        if map.is_empty() {
            return Err(PreprocessError::JsonlEntry { line: line_no, reason: "entry is empty" });
        }
        if !map.values().any(is_non_empty_value) {
            return Err(PreprocessError::JsonlEntry {
                line: line_no,
                reason: "entry has no non-empty values",
            });
        }
        entries.push(map);
    }
    if entries.is_empty() {
        return Err(PreprocessError::EmptyJsonl);
    }
    Ok(entries)
}

fn parse_json(text: &str, category: &Category) -> Result<Value, PreprocessError> {
    let value: Value = serde_json::from_str(text)?;
    if *category == Category::ScanSync {
        let scan_shaped = value
            .as_object()
            .is_some_and(|obj| SCAN_KEYS.iter().any(|key| obj.contains_key(*key)));
        if !scan_shaped {
            return Err(PreprocessError::NotScanShaped);
        }
    }
    Ok(value)
}

pub(crate) fn is_non_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
