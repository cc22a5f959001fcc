//! Destination routing.
//!
//! A flat first-match table over `(category, data shape)`. No randomness and
//! no clock, so the same input always routes the same way.

use crate::domain::{Category, Destination, FileFormat, RecordData, RouteDecision, RouteStats, SanitizedItem};

pub mod shapes;
pub mod summary;

pub use shapes::{is_people_shaped, is_report_shaped, is_scan_shaped};
pub use summary::summarize_scan;

pub const FINDINGS_TABLE: &str = "findings";
pub const PEOPLE_TABLE: &str = "people";
pub const REPORTS_TABLE: &str = "reports";

pub const PROJECT_KNOWLEDGE: &str = "project-knowledge";
pub const CLIENTS: &str = "clients";
pub const DOMAIN_KNOWLEDGE: &str = "domain-knowledge";
pub const SESSION_KNOWLEDGE: &str = "session-knowledge";
pub const TROUBLESHOOTING_KNOWLEDGE: &str = "troubleshooting-knowledge";
pub const GENERAL_KNOWLEDGE: &str = "general-knowledge";

fn sql(table: &str, reason: impl Into<String>) -> RouteDecision {
    RouteDecision {
        destination: Destination::Sql,
        reason: reason.into(),
        sql_table: Some(table.to_string()),
        rag_collection: None,
        create_summary: false,
    }
}

fn rag(collection: &str, reason: impl Into<String>) -> RouteDecision {
    RouteDecision {
        destination: Destination::Rag,
        reason: reason.into(),
        sql_table: None,
        rag_collection: Some(collection.to_string()),
        create_summary: false,
    }
}

/// Decide where a sanitized payload goes.
pub fn route(category: &Category, data: &RecordData, format: FileFormat) -> RouteDecision {
    match category {
        Category::ScanSync if is_scan_shaped(data) => RouteDecision {
            destination: Destination::Both,
            reason: "scan results: findings to structured store, summary to knowledge base".into(),
            sql_table: Some(FINDINGS_TABLE.to_string()),
            rag_collection: Some(PROJECT_KNOWLEDGE.to_string()),
            create_summary: true,
        },
        Category::ScanSync => rag(
            PROJECT_KNOWLEDGE,
            format!("scan/sync {} content without findings", format.as_str()),
        ),
        Category::ClientIntake if is_people_shaped(data) => {
            sql(PEOPLE_TABLE, "client intake with contact details")
        }
        Category::ClientIntake if is_report_shaped(data) => {
            sql(REPORTS_TABLE, "client intake report or assessment")
        }
        Category::ClientIntake => rag(CLIENTS, "client intake narrative"),
        Category::DomainKnowledge => rag(DOMAIN_KNOWLEDGE, "domain knowledge"),
        Category::ProjectDocs => rag(PROJECT_KNOWLEDGE, "project documentation"),
        Category::Sessions => rag(SESSION_KNOWLEDGE, "session notes"),
        Category::Troubleshooting => rag(TROUBLESHOOTING_KNOWLEDGE, "troubleshooting knowledge"),
        Category::Other(name) => rag(
            GENERAL_KNOWLEDGE,
            format!("unknown category, defaulting to {GENERAL_KNOWLEDGE} (category: {name})"),
        ),
    }
}

/// Route a gated item. Anything that did not pass the gate is skipped.
pub fn route_item(item: &SanitizedItem) -> RouteDecision {
    if !item.passed() {
        let why = if item.duplicate {
            "duplicate content".to_string()
        } else {
            item.issues_found.join(", ")
        };
        return RouteDecision::skip(format!("failed sanitization: {why}"));
    }
    match &item.sanitized {
        Some(data) => route(item.preprocessed.category(), data, item.preprocessed.format()),
        None => RouteDecision::skip("not sanitized"),
    }
}

impl RouteStats {
    pub fn record(&mut self, destination: Destination) {
        match destination {
            Destination::Sql => self.sql += 1,
            Destination::Rag => self.rag += 1,
            Destination::Both => self.both += 1,
            Destination::Skip => self.skip += 1,
        }
    }
}
