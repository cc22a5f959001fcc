//! File discovery across category directories

use crate::domain::{Config, DiscoveryStats, RawFile};
use anyhow::Result;
use std::path::Path;

pub mod scanner;

pub use scanner::{Discovery, FileScanner};

/// Discover files under `root` using the category mapping and filters from `config`.
pub fn discover(root: &Path, config: &Config) -> Result<(Discovery, DiscoveryStats)> {
    let mut scanner = FileScanner::new(root.to_path_buf())
        .categories(config.categories.clone())
        .include_extensions(config.extensions.clone())
        .exclude_globs(config.exclude_globs.clone())
        .follow_symlinks(config.follow_symlinks);
    let discovery = scanner.scan()?;
    let stats = scanner.stats().clone();
    Ok((discovery, stats))
}

/// Flatten a discovery into processing order: by category, then by path.
pub fn ordered_files(discovery: Discovery) -> Vec<RawFile> {
    discovery.into_values().flatten().collect()
}
