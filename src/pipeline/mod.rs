//! Batch runner: discovery through archival, strictly in stage order.
//!
//! Per-item problems never abort a run. Only startup failures do: an explicit
//! config that does not parse, an archive or output root that cannot be
//! created, or a persistent ledger that cannot be opened.

use crate::archive::{Archiver, CleanupOutcome};
use crate::domain::{
    CleanupStats, Config, Destination, RouteDecision, RouteStats, RoutedItem, RunStats,
};
use crate::label::Labeler;
use crate::normalize::normalize_all;
use crate::preprocess::preprocess_all;
use crate::render::{write_handoff, write_report, REPORT_FILE};
use crate::route::route_item;
use crate::sanitize::{HashLedger, MemoryLedger, Sanitizer, SqliteLedger};
use crate::scan::{discover, ordered_files};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

const STAGES: u64 = 8;

/// Everything a run produced, in discovery order.
pub struct RunReport {
    pub items: Vec<RoutedItem>,
    /// Aligned with `items`.
    pub cleanup: Vec<CleanupOutcome>,
    pub stats: RunStats,
    pub output_files: Vec<PathBuf>,
}

impl RunReport {
    pub fn item(&self, relative_path: &str) -> Option<(&RoutedItem, &CleanupOutcome)> {
        self.items
            .iter()
            .zip(&self.cleanup)
            .find(|(item, _)| item.file().relative_path == relative_path)
    }
}

pub struct Pipeline {
    root: PathBuf,
    config: Config,
    sanitizer: Sanitizer,
    labeler: Labeler,
    show_progress: bool,
}

impl Pipeline {
    /// Build a pipeline over `root`, opening the persistent ledger if one is
    /// configured. Dry runs always dedup in memory.
    pub fn new(root: &Path, config: Config) -> Result<Self> {
        let ledger: Box<dyn HashLedger> = match &config.dedup.persist_path {
            Some(path) if !config.dry_run => {
                let path = resolve(root, path);
                let ledger = SqliteLedger::open(&path)
                    .with_context(|| format!("Failed opening dedup ledger: {}", path.display()))?;
                tracing::debug!(path = %path.display(), "using persistent dedup ledger");
                Box::new(ledger)
            }
            _ => Box::new(MemoryLedger::new()),
        };
        Ok(Self::with_ledger(root, config, ledger))
    }

    pub fn with_ledger(root: &Path, config: Config, ledger: Box<dyn HashLedger>) -> Self {
        let labeler = Labeler::new(config.labeling.clone());
        Self {
            root: root.to_path_buf(),
            config,
            sanitizer: Sanitizer::new(ledger),
            labeler,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<RunReport> {
        let start_time = Instant::now();
        let config = &self.config;

        let archiver = if config.archive.enabled {
            let (sql_root, rag_root) = config.archive.resolve(&self.root);
            Some(Archiver::new(sql_root, rag_root, config.dry_run)?)
        } else {
            None
        };
        let output_dir = resolve(&self.root, &config.output_dir);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed creating output directory: {}", output_dir.display()))?;

        let progress = stage_bar(self.show_progress);

        progress.set_message("discovering files");
        let (discovery, discovery_stats) = discover(&self.root, config)?;
        let files = ordered_files(discovery);
        tracing::info!(files = files.len(), "discovery complete");
        progress.inc(1);

        progress.set_message("preprocessing");
        let (preprocessed, preprocess_stats) = preprocess_all(files);
        tracing::info!(valid = preprocess_stats.valid, invalid = preprocess_stats.invalid, "preprocessing complete");
        progress.inc(1);

        progress.set_message("sanitizing");
        let (sanitized, sanitize_stats) = self.sanitizer.sanitize_all(preprocessed);
        tracing::info!(
            passed = sanitize_stats.passed,
            repaired = sanitize_stats.repaired,
            failed = sanitize_stats.failed,
            duplicates = sanitize_stats.duplicates,
            "sanitization complete"
        );
        progress.inc(1);

        progress.set_message("normalizing");
        let (units, normalize_stats) = normalize_all(&sanitized);
        tracing::info!(
            units = normalize_stats.units_created,
            json_repaired = normalize_stats.json_repaired,
            "normalization complete"
        );
        progress.inc(1);

        progress.set_message("labeling");
        let (labeled, label_stats) = self.labeler.label_all(units);
        progress.inc(1);

        progress.set_message("routing");
        let mut route_stats = RouteStats::default();
        let items: Vec<RoutedItem> = sanitized
            .into_iter()
            .zip(labeled)
            .map(|(item, units)| {
                let mut route = route_item(&item);
                if route.destination != Destination::Skip && units.is_empty() {
                    route = RouteDecision::skip("normalization produced no units");
                }
                tracing::debug!(
                    path = %item.file().path.display(),
                    destination = route.destination.as_str(),
                    reason = %route.reason,
                    "routed"
                );
                route_stats.record(route.destination);
                RoutedItem { sanitized: item, units, route }
            })
            .collect();
        progress.inc(1);

        progress.set_message("writing handoff");
        let mut output_files = write_handoff(&output_dir, &items)?;
        match self.sanitizer.ledger().commit() {
            Ok(written) => tracing::debug!(written, "dedup ledger committed"),
            Err(err) => tracing::warn!(error = %err, "dedup ledger commit failed; hashes will be seen as new next run"),
        }
        progress.inc(1);

        progress.set_message("archiving sources");
        let (cleanup, cleanup_stats) = match &archiver {
            Some(archiver) => archiver.archive_all(&items),
            None => archival_disabled(items.len()),
        };
        tracing::info!(
            moved = cleanup_stats.moved,
            planned = cleanup_stats.planned,
            failed = cleanup_stats.failed,
            "cleanup complete"
        );
        progress.inc(1);
        progress.finish_and_clear();

        let stats = RunStats {
            discovery: discovery_stats,
            preprocess: preprocess_stats,
            sanitize: sanitize_stats,
            normalize: normalize_stats,
            label: label_stats,
            route: route_stats,
            cleanup: cleanup_stats,
            processing_time_seconds: start_time.elapsed().as_secs_f64(),
        };

        let report_path = output_dir.join(REPORT_FILE);
        output_files.push(report_path.clone());
        let output_names: Vec<String> = output_files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        let config_value = serde_json::to_value(config)?;
        write_report(&report_path, &stats, &items, &cleanup, &output_names, &config_value, true)
            .with_context(|| format!("Failed writing {}", report_path.display()))?;

        Ok(RunReport { items, cleanup, stats, output_files })
    }
}

fn archival_disabled(count: usize) -> (Vec<CleanupOutcome>, CleanupStats) {
    let outcomes = (0..count)
        .map(|_| CleanupOutcome::Skipped { reason: "archival disabled".to_string() })
        .collect();
    (outcomes, CleanupStats { skipped: count, ..CleanupStats::default() })
}

fn stage_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(STAGES);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QualityGate;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn run_over_empty_root_writes_empty_handoff() {
        let tmp = TempDir::new().unwrap();
        let report = Pipeline::new(tmp.path(), Config::default()).unwrap().run().unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.stats.discovery.directories_missing, Config::default().categories.len());
        let out = tmp.path().join("docgate-out");
        assert_eq!(fs::read_to_string(out.join("sql.jsonl")).unwrap(), "");
        assert!(out.join("report.json").exists());
    }

    #[test]
    fn failed_items_skip_every_later_stage() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sessions");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.jsonl"), "{\"content\": \"ok\"}\nnot json\n").unwrap();

        let report = Pipeline::new(tmp.path(), Config::default()).unwrap().run().unwrap();
        let (item, cleanup) = report.item("bad.jsonl").unwrap();
        assert_eq!(item.sanitized.quality_gate, QualityGate::Fail);
        assert!(item.units.is_empty());
        assert_eq!(item.route.destination, Destination::Skip);
        assert!(matches!(cleanup, CleanupOutcome::Skipped { .. }));
        assert!(dir.join("bad.jsonl").exists());
    }

    #[test]
    fn disabled_archival_leaves_sources_in_place() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("domain-SME");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("k8s.md"), "# Pods\nA pod runs containers.").unwrap();

        let mut config = Config::default();
        config.archive.enabled = false;
        let report = Pipeline::new(tmp.path(), config).unwrap().run().unwrap();
        assert_eq!(report.stats.route.rag, 1);
        assert_eq!(report.stats.cleanup.skipped, 1);
        assert!(dir.join("k8s.md").exists());
        assert!(!tmp.path().join("processed").exists());
    }
}
