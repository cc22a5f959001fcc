//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Section name accepted when the settings live inside a shared file.
const NESTED_SECTION: &str = "docgate";

const CANDIDATES: &[&str] = &["docgate.toml", ".docgate.toml", "docgate.yml", "docgate.yaml"];

/// Load config from `config_path`, or from the first candidate file found in
/// `input_root`. An explicit file that fails to parse is an error; a
/// discovered one only warns and falls back to defaults.
pub fn load_config(input_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(input_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let parsed = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))
        .and_then(|content| parse_config(&content, &config_file));

    match parsed {
        Ok(cfg) => {
            tracing::debug!(path = %config_file.display(), "loaded config");
            Ok(cfg)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {:#}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

fn parse_config(content: &str, config_file: &Path) -> Result<Config> {
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_config(content, config_file),
        "yaml" | "yml" => parse_yaml_config(content, config_file),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    }
}

/// Parse TOML config, accepting a nested `[docgate]` section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(NESTED_SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    Config::deserialize(config_val)
        .with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, accepting a nested `docgate:` mapping.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(NESTED_SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(input_root: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| input_root.join(candidate)).find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("docgate.toml"),
            "dry_run = true\noutput_dir = 'handoff'\n\n[archive]\nsql_root = '/srv/sql'\n\n[categories]\nnotes = 'sessions'\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert!(cfg.dry_run);
        assert_eq!(cfg.output_dir, PathBuf::from("handoff"));
        assert_eq!(cfg.archive.sql_root, PathBuf::from("/srv/sql"));
        assert_eq!(cfg.archive.rag_root, PathBuf::from("processed/rag"));
        assert_eq!(cfg.categories.get("notes"), Some(&Category::Sessions));
        assert_eq!(cfg.categories.len(), 1);
    }

    #[test]
    fn test_nested_section_in_yaml() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("docgate.yml"),
            "docgate:\n  exclude_globs: 'drafts/**, *.bak.md'\n  dedup:\n    persist_path: state/seen.db\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.exclude_globs, vec!["drafts/**", "*.bak.md"]);
        assert_eq!(cfg.dedup.persist_path, Some(PathBuf::from("state/seen.db")));
    }

    #[test]
    fn test_explicit_config_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "extensions = 123\n").expect("write");

        let result = load_config(tmp.path(), Some(&path));
        assert!(result.is_err(), "explicit config with numeric extensions should return Err");
    }

    #[test]
    fn test_explicit_config_unsupported_extension_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("docgate.ini");
        fs::write(&path, "dry_run=true\n").expect("write");
        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_auto_discovered_invalid_type_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("docgate.toml"), "exclude_globs = false\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_list_normalization_extensions_array() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "extensions = [\".md\", \"JSON\", \"  txt  \"]\n").expect("write");

        let cfg = load_config(tmp.path(), Some(&path)).expect("config");
        assert_eq!(cfg.extensions, vec![".md", ".json", ".txt"]);
    }
}
