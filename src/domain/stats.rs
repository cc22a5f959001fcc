//! Per-stage counters, polled by the run report.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryStats {
    pub directories_scanned: usize,
    pub directories_missing: usize,
    pub files_seen: usize,
    pub files_included: usize,
    pub files_skipped_extension: usize,
    pub files_skipped_hidden: usize,
    pub files_skipped_glob: usize,
    pub files_by_category: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreprocessStats {
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SanitizeStats {
    pub processed: usize,
    pub passed: usize,
    pub repaired: usize,
    pub failed: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeStats {
    pub processed: usize,
    pub converted: usize,
    pub units_created: usize,
    pub json_repaired: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelStats {
    pub processed: usize,
    pub domains: BTreeMap<String, usize>,
    pub types: BTreeMap<String, usize>,
    pub difficulty: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteStats {
    pub sql: usize,
    pub rag: usize,
    pub both: usize,
    pub skip: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupStats {
    pub moved: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Aggregate of every stage's counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub discovery: DiscoveryStats,
    pub preprocess: PreprocessStats,
    pub sanitize: SanitizeStats,
    pub normalize: NormalizeStats,
    pub label: LabelStats,
    pub route: RouteStats,
    pub cleanup: CleanupStats,
    pub processing_time_seconds: f64,
}

impl RunStats {
    pub fn to_report_value(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "processing_time_seconds".to_string(),
                serde_json::json!((self.processing_time_seconds * 100.0).round() / 100.0),
            );
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::RunStats;

    #[test]
    fn report_value_nests_stage_counters() {
        let mut stats = RunStats::default();
        stats.sanitize.duplicates = 2;
        stats.route.both = 1;
        stats.processing_time_seconds = 1.23456;

        let value = stats.to_report_value();
        assert_eq!(value["sanitize"]["duplicates"], 2);
        assert_eq!(value["route"]["both"], 1);
        assert_eq!(value["processing_time_seconds"], 1.23);
    }
}
