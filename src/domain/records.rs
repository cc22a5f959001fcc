//! Stage records.
//!
//! Each stage wraps the previous stage's record instead of mutating it, so a
//! `RoutedItem` still carries the untouched `PreprocessedItem` it started as.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Category tag attached to every discovered file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    DomainKnowledge,
    ProjectDocs,
    Sessions,
    Troubleshooting,
    ScanSync,
    ClientIntake,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::DomainKnowledge => "domain_knowledge",
            Category::ProjectDocs => "project_docs",
            Category::Sessions => "sessions",
            Category::Troubleshooting => "troubleshooting",
            Category::ScanSync => "scan_sync",
            Category::ClientIntake => "client_intake",
            Category::Other(name) => name.as_str(),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "domain_knowledge" | "domain_sme" => Category::DomainKnowledge,
            "project_docs" | "projects_docs" => Category::ProjectDocs,
            "sessions" | "session_notes" => Category::Sessions,
            "troubleshooting" => Category::Troubleshooting,
            "scan_sync" | "sync" => Category::ScanSync,
            "client_intake" => Category::ClientIntake,
            _ => Category::Other(normalized),
        })
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source format, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Markdown,
    Text,
    Json,
    Jsonl,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.') {
            "md" | "markdown" => Some(FileFormat::Markdown),
            "txt" => Some(FileFormat::Text),
            "json" => Some(FileFormat::Json),
            "jsonl" => Some(FileFormat::Jsonl),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Markdown => "markdown",
            FileFormat::Text => "text",
            FileFormat::Json => "json",
            FileFormat::Jsonl => "jsonl",
        }
    }
}

/// A discovered filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFile {
    pub path: PathBuf,
    /// Path relative to the category directory, forward slashes.
    pub relative_path: String,
    pub category: Category,
    pub format: FileFormat,
}

impl RawFile {
    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }
}

/// Parsed payload of a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RecordData {
    Jsonl(Vec<Map<String, Value>>),
    Json(Value),
    Text(String),
}

impl RecordData {
    /// String used for content hashing: sorted-key compact JSON for
    /// structured data, the text itself otherwise.
    pub fn canonical_string(&self) -> String {
        match self {
            RecordData::Jsonl(entries) => {
                let values: Vec<Value> =
                    entries.iter().map(|e| canonical_value(&Value::Object(e.clone()))).collect();
                Value::Array(values).to_string()
            }
            RecordData::Json(value) => canonical_value(value).to_string(),
            RecordData::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RecordData::Jsonl(entries) => entries.is_empty(),
            RecordData::Json(value) => match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            },
            RecordData::Text(text) => text.trim().is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RecordData::Json(Value::Null))
    }
}

/// Rebuild a JSON value with every object's keys in sorted order.
pub fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonical_value(v))).collect();
            let mut out = Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

/// Output of the preprocessing stage.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessedItem {
    pub file: RawFile,
    pub data: Option<RecordData>,
    pub valid: bool,
    pub error: Option<String>,
}

impl PreprocessedItem {
    pub fn valid(file: RawFile, data: RecordData) -> Self {
        Self { file, data: Some(data), valid: true, error: None }
    }

    pub fn invalid(file: RawFile, data: Option<RecordData>, error: impl Into<String>) -> Self {
        Self { file, data, valid: false, error: Some(error.into()) }
    }

    pub fn category(&self) -> &Category {
        &self.file.category
    }

    pub fn format(&self) -> FileFormat {
        self.file.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGate {
    Pass,
    Repair,
    Fail,
}

impl QualityGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGate::Pass => "PASS",
            QualityGate::Repair => "REPAIR",
            QualityGate::Fail => "FAIL",
        }
    }
}

/// Output of the sanitization gate.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedItem {
    pub preprocessed: PreprocessedItem,
    /// Scrubbed copy of the payload; `None` when the gate failed.
    pub sanitized: Option<RecordData>,
    pub quality_gate: QualityGate,
    pub issues_found: Vec<String>,
    pub issues_fixed: Vec<String>,
    pub duplicate: bool,
    pub content_hash: Option<String>,
}

impl SanitizedItem {
    pub fn passed(&self) -> bool {
        self.quality_gate != QualityGate::Fail
    }

    pub fn file(&self) -> &RawFile {
        &self.preprocessed.file
    }
}

/// Canonical atomic record from normalization onward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedUnit {
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl NormalizedUnit {
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labels {
    pub domain: BTreeSet<String>,
    #[serde(rename = "type")]
    pub types: BTreeSet<String>,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub labeled_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledUnit {
    pub unit: NormalizedUnit,
    pub labels: Labels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Destination {
    Sql,
    Rag,
    Both,
    Skip,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Sql => "SQL",
            Destination::Rag => "RAG",
            Destination::Both => "BOTH",
            Destination::Skip => "SKIP",
        }
    }

    pub fn feeds_sql(&self) -> bool {
        matches!(self, Destination::Sql | Destination::Both)
    }

    pub fn feeds_rag(&self) -> bool {
        matches!(self, Destination::Rag | Destination::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub destination: Destination,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_collection: Option<String>,
    pub create_summary: bool,
}

impl RouteDecision {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            destination: Destination::Skip,
            reason: reason.into(),
            sql_table: None,
            rag_collection: None,
            create_summary: false,
        }
    }
}

/// Terminal record for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedItem {
    pub sanitized: SanitizedItem,
    pub units: Vec<LabeledUnit>,
    pub route: RouteDecision,
}

impl RoutedItem {
    pub fn file(&self) -> &RawFile {
        self.sanitized.file()
    }
}
