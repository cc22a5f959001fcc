//! Quality gate: structure, duplicates, scrubbing.
//!
//! Gates run in order and stop at the first failure. Items are gated one at a
//! time in discovery order, so the first copy of duplicated content always wins.

use crate::domain::{PreprocessedItem, QualityGate, RecordData, SanitizeStats, SanitizedItem};
use crate::redact::{Redactor, ScrubReport};
use crate::utils::content_hash;

pub mod ledger;

pub use ledger::{HashLedger, LedgerError, MemoryLedger, SqliteLedger};

pub struct Sanitizer {
    redactor: Redactor,
    ledger: Box<dyn HashLedger>,
}

impl Sanitizer {
    pub fn new(ledger: Box<dyn HashLedger>) -> Self {
        Self { redactor: Redactor::new(), ledger }
    }

    /// Run-scoped dedup.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryLedger::new()))
    }

    pub fn ledger(&self) -> &dyn HashLedger {
        self.ledger.as_ref()
    }

    pub fn sanitize(&self, item: PreprocessedItem) -> SanitizedItem {
        // Gate 1: structure
        if let Some(issue) = structural_issue(&item) {
            tracing::debug!(path = %item.file.path.display(), %issue, "structural check failed");
            return fail(item, vec![issue], false, None);
        }
        let Some(data) = item.data.as_ref() else {
            return fail(item, vec!["data_is_null".to_string()], false, None);
        };

        // Gate 2: duplicates
        let hash = content_hash(&data.canonical_string());
        match self.ledger.check_and_insert(&hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(path = %item.file.path.display(), hash = %hash, "duplicate content");
                return fail(item, vec!["duplicate_content".to_string()], true, Some(hash));
            }
            Err(err) => {
                tracing::warn!(path = %item.file.path.display(), error = %err, "dedup check failed");
                return fail(item, vec![format!("dedup_check_failed: {err}")], false, Some(hash));
            }
        }

        // Gate 3: scrub
        let (sanitized, report) = self.scrub(data);
        let issues_found: Vec<String> =
            report.kinds.iter().map(|k| k.issue_found().to_string()).collect();
        let issues_fixed: Vec<String> =
            report.kinds.iter().map(|k| k.issue_fixed().to_string()).collect();
        let quality_gate = if report.is_clean() { QualityGate::Pass } else { QualityGate::Repair };

        SanitizedItem {
            preprocessed: item,
            sanitized: Some(sanitized),
            quality_gate,
            issues_found,
            issues_fixed,
            duplicate: false,
            content_hash: Some(hash),
        }
    }

    pub fn sanitize_all(&self, items: Vec<PreprocessedItem>) -> (Vec<SanitizedItem>, SanitizeStats) {
        let mut stats = SanitizeStats::default();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let sanitized = self.sanitize(item);
            stats.processed += 1;
            match sanitized.quality_gate {
                QualityGate::Pass => stats.passed += 1,
                QualityGate::Repair => stats.repaired += 1,
                QualityGate::Fail => stats.failed += 1,
            }
            if sanitized.duplicate {
                stats.duplicates += 1;
            }
            out.push(sanitized);
        }
        (out, stats)
    }

    fn scrub(&self, data: &RecordData) -> (RecordData, ScrubReport) {
        match data {
            RecordData::Text(text) => {
                let outcome = self.redactor.redact_report(text);
                (RecordData::Text(outcome.content), outcome.report)
            }
            RecordData::Json(value) => {
                let (scrubbed, report) = self.redactor.redact_value(value);
                (RecordData::Json(scrubbed), report)
            }
            RecordData::Jsonl(entries) => {
                let mut report = ScrubReport::default();
                let scrubbed = entries.iter().map(|entry| self.redactor.walk_map(entry, &mut report)).collect();
                (RecordData::Jsonl(scrubbed), report)
            }
        }
    }
}

fn structural_issue(item: &PreprocessedItem) -> Option<String> {
    if !item.valid {
        let reason = item.error.as_deref().unwrap_or("unknown error");
        return Some(format!("preprocessing_failed: {reason}"));
    }
    match &item.data {
        None => Some("data_is_null".to_string()),
        Some(data) if data.is_null() => Some("data_is_null".to_string()),
        Some(data) if data.is_empty() => Some("data_is_empty".to_string()),
        Some(_) => None,
    }
}

fn fail(
    item: PreprocessedItem,
    issues: Vec<String>,
    duplicate: bool,
    content_hash: Option<String>,
) -> SanitizedItem {
    SanitizedItem {
        preprocessed: item,
        sanitized: None,
        quality_gate: QualityGate::Fail,
        issues_found: issues,
        issues_fixed: Vec::new(),
        duplicate,
        content_hash,
    }
}
