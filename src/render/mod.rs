//! Handoff files and run report

pub mod jsonl;
pub mod report;

pub use jsonl::{rag_records, render_jsonl, sql_records};
pub use report::write_report;

use crate::domain::RoutedItem;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const SQL_HANDOFF_FILE: &str = "sql.jsonl";
pub const RAG_HANDOFF_FILE: &str = "rag.jsonl";
pub const REPORT_FILE: &str = "report.json";

/// Write `sql.jsonl` and `rag.jsonl` into `output_dir`. Both files are always
/// written, possibly empty, so a consumer never reads a stale handoff.
pub fn write_handoff(output_dir: &Path, items: &[RoutedItem]) -> Result<Vec<PathBuf>> {
    let sql_path = output_dir.join(SQL_HANDOFF_FILE);
    let rag_path = output_dir.join(RAG_HANDOFF_FILE);
    std::fs::write(&sql_path, render_jsonl(&sql_records(items)))
        .with_context(|| format!("Failed writing {}", sql_path.display()))?;
    std::fs::write(&rag_path, render_jsonl(&rag_records(items)))
        .with_context(|| format!("Failed writing {}", rag_path.display()))?;
    Ok(vec![sql_path, rag_path])
}
