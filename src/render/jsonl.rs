//! JSONL handoff records for the structured store and the vector store.

use crate::domain::{Category, LabeledUnit, RecordData, RoutedItem};
use crate::route::summarize_scan;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One record per unit of every SQL- or BOTH-routed item.
pub fn sql_records(items: &[RoutedItem]) -> Vec<Value> {
    let mut records = Vec::new();
    for item in items.iter().filter(|i| i.route.destination.feeds_sql()) {
        let table = item.route.sql_table.clone().unwrap_or_default();
        for unit in &item.units {
            let mut entry: BTreeMap<&str, Value> = BTreeMap::new();
            entry.insert("table", Value::String(table.clone()));
            entry.insert("content", Value::String(unit.unit.content.clone()));
            entry.insert("metadata", Value::Object(unit.unit.metadata.clone()));
            entry.insert("labels", serde_json::to_value(&unit.labels).unwrap_or(Value::Null));
            entry.insert("source", Value::String(item.file().relative_path.clone()));
            records.push(to_value(entry));
        }
    }
    records
}

/// One record per unit of every RAG- or BOTH-routed item, plus a scan
/// summary record when the route asks for one.
pub fn rag_records(items: &[RoutedItem]) -> Vec<Value> {
    let mut records = Vec::new();
    for item in items.iter().filter(|i| i.route.destination.feeds_rag()) {
        let collection = item.route.rag_collection.clone().unwrap_or_default();
        for unit in &item.units {
            records.push(rag_record(&collection, unit.unit.content.clone(), rag_metadata(unit)));
        }

        if item.route.create_summary {
            if let Some(RecordData::Json(value)) = &item.sanitized.sanitized {
                if let Some(summary) = summarize_scan(value) {
                    records.push(rag_record(
                        &collection,
                        summary,
                        summary_metadata(&item.file().relative_path, &item.file().category),
                    ));
                }
            }
        }
    }
    records
}

/// Vector-store metadata: the unit's metadata with the labels folded in.
fn rag_metadata(unit: &LabeledUnit) -> Map<String, Value> {
    let mut metadata = unit.unit.metadata.clone();
    let labels = &unit.labels;
    metadata.insert("domain".into(), Value::from(labels.domain.iter().cloned().collect::<Vec<_>>()));
    metadata.insert("type".into(), Value::from(labels.types.iter().cloned().collect::<Vec<_>>()));
    metadata.insert("difficulty".into(), Value::String(labels.difficulty.as_str().into()));
    metadata.insert("tags".into(), Value::from(labels.tags.clone()));
    metadata.insert("labeled_at".into(), Value::String(labels.labeled_at.clone()));
    metadata
}

fn summary_metadata(source: &str, category: &Category) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("source".into(), Value::String(source.to_string()));
    metadata.insert("category".into(), Value::String(category.as_str().to_string()));
    metadata.insert("kind".into(), Value::String("scan_summary".into()));
    metadata
}

fn rag_record(collection: &str, content: String, metadata: Map<String, Value>) -> Value {
    let mut entry: BTreeMap<&str, Value> = BTreeMap::new();
    entry.insert("collection", Value::String(collection.to_string()));
    entry.insert("content", Value::String(content));
    entry.insert("metadata", Value::Object(metadata));
    to_value(entry)
}

fn to_value(entry: BTreeMap<&str, Value>) -> Value {
    Value::Object(entry.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

pub fn render_jsonl(records: &[Value]) -> String {
    let lines: Vec<String> = records.iter().filter_map(|r| serde_json::to_string(r).ok()).collect();
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}
