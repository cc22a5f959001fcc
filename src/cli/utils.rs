//! Shared CLI utilities.

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::Config;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Canonicalize an input root, rejecting anything that is not a directory.
pub fn input_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Cannot access input root {}: {}", path.display(), e))?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }
    Ok(root)
}

/// Load the config for `root` and layer the CLI overrides on top.
pub fn resolve_config(root: &Path, config_path: Option<&Path>, overrides: CliOverrides) -> Result<Config> {
    let file_config = load_config(root, config_path)?;
    Ok(merge_cli_with_config(file_config, overrides))
}

pub fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
