//! Layering CLI flags over file config

use crate::domain::config::normalize_extension;
use crate::domain::Config;
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the file (or default)
/// value in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub follow_symlinks: Option<bool>,
    pub dry_run: Option<bool>,
    pub archive_enabled: Option<bool>,
    pub sql_root: Option<PathBuf>,
    pub rag_root: Option<PathBuf>,
    pub dedup_persist_path: Option<PathBuf>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(root) = cli.input_root {
        config.input_root = Some(root);
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(exts) = cli.extensions {
        config.extensions = exts.iter().map(|e| normalize_extension(e)).collect();
    }
    if let Some(globs) = cli.exclude_globs {
        config.exclude_globs = globs;
    }
    if let Some(follow) = cli.follow_symlinks {
        config.follow_symlinks = follow;
    }
    if let Some(dry_run) = cli.dry_run {
        config.dry_run = dry_run;
    }
    if let Some(enabled) = cli.archive_enabled {
        config.archive.enabled = enabled;
    }
    if let Some(root) = cli.sql_root {
        config.archive.sql_root = root;
    }
    if let Some(root) = cli.rag_root {
        config.archive.rag_root = root;
    }
    if let Some(path) = cli.dedup_persist_path {
        config.dedup.persist_path = Some(path);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_keep_file_values() {
        let mut file = Config::default();
        file.dry_run = true;
        file.output_dir = PathBuf::from("out");
        let merged = merge_cli_with_config(file.clone(), CliOverrides::default());
        assert_eq!(merged, file);
    }

    #[test]
    fn cli_values_win() {
        let mut file = Config::default();
        file.exclude_globs = vec!["drafts/**".into()];
        file.archive.sql_root = PathBuf::from("/srv/sql");

        let merged = merge_cli_with_config(
            file,
            CliOverrides {
                extensions: Some(vec!["MD".into(), ".json".into()]),
                exclude_globs: Some(vec!["*.tmp".into()]),
                follow_symlinks: Some(true),
                archive_enabled: Some(false),
                rag_root: Some(PathBuf::from("/srv/rag")),
                dedup_persist_path: Some(PathBuf::from("seen.db")),
                ..CliOverrides::default()
            },
        );

        assert_eq!(merged.extensions, vec![".md", ".json"]);
        assert_eq!(merged.exclude_globs, vec!["*.tmp"]);
        assert!(merged.follow_symlinks);
        assert!(!merged.archive.enabled);
        assert_eq!(merged.archive.sql_root, PathBuf::from("/srv/sql"));
        assert_eq!(merged.archive.rag_root, PathBuf::from("/srv/rag"));
        assert_eq!(merged.dedup.persist_path, Some(PathBuf::from("seen.db")));
    }
}
