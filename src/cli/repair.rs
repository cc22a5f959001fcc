//! Repair command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::normalize::repair::repair_json;
use crate::utils::read_file_lenient;

#[derive(Args)]
pub struct RepairArgs {
    /// File holding JSON-like text (fenced, double-escaped, trailing commas)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print compact JSON instead of pretty
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: RepairArgs) -> Result<()> {
    let (text, encoding) = read_file_lenient(&args.file)
        .with_context(|| format!("Failed reading {}", args.file.display()))?;
    tracing::debug!(path = %args.file.display(), encoding = %encoding, "read input");

    let outcome = repair_json(&text);
    let Some(value) = outcome.value.as_ref() else {
        anyhow::bail!("Could not recover JSON from {}", args.file.display());
    };

    if outcome.applied.is_empty() {
        eprintln!("Parsed as-is; no repair needed");
    } else {
        eprintln!("Repairs applied: {}", outcome.applied.join(", "));
    }

    let rendered = if args.compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
