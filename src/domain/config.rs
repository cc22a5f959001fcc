//! Pipeline configuration model.

use super::records::Category;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &[&str] = &[".md", ".txt", ".json", ".jsonl"];

/// Default directory name → category mapping for the input root.
pub fn default_category_dirs() -> BTreeMap<String, Category> {
    [
        ("domain-SME", Category::DomainKnowledge),
        ("projects-docs", Category::ProjectDocs),
        ("sessions", Category::Sessions),
        ("session-notes", Category::Sessions),
        ("session-summaries", Category::Sessions),
        ("research-notes", Category::Sessions),
        ("troubleshooting", Category::Troubleshooting),
        ("sync", Category::ScanSync),
        ("client-intake", Category::ClientIntake),
    ]
    .into_iter()
    .map(|(dir, category)| (dir.to_string(), category))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_root: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub categories: BTreeMap<String, Category>,
    #[serde(deserialize_with = "deserialize_extensions")]
    pub extensions: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
    pub dry_run: bool,
    pub archive: ArchiveConfig,
    pub dedup: DedupConfig,
    pub labeling: LabelingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: None,
            output_dir: PathBuf::from("docgate-out"),
            categories: default_category_dirs(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            dry_run: false,
            archive: ArchiveConfig::default(),
            dedup: DedupConfig::default(),
            labeling: LabelingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,
    /// Archive root for SQL-routed sources. Relative paths resolve against the input root.
    pub sql_root: PathBuf,
    /// Archive root for RAG- and BOTH-routed sources.
    pub rag_root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sql_root: PathBuf::from("processed/sql"),
            rag_root: PathBuf::from("processed/rag"),
        }
    }
}

impl ArchiveConfig {
    pub fn resolve(&self, input_root: &Path) -> (PathBuf, PathBuf) {
        (resolve_against(input_root, &self.sql_root), resolve_against(input_root, &self.rag_root))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// SQLite file for cross-run dedup. `None` keeps seen hashes in memory for one run.
    pub persist_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    pub max_tags: usize,
    pub max_acronyms: usize,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self { max_tags: 10, max_acronyms: 5 }
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn split_list(raw: StringOrList) -> Vec<String> {
    let parts = match raw {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(v) => v,
    };
    parts.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

/// Accepts `"a, b"` or `["a", "b"]`.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(split_list(StringOrList::deserialize(deserializer)?))
}

/// Like [`deserialize_string_list`], lowercased with a leading dot.
pub fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = split_list(StringOrList::deserialize(deserializer)?);
    Ok(list.into_iter().map(|ext| normalize_extension(&ext)).collect())
}

pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_known_category() {
        let cfg = Config::default();
        let categories: std::collections::BTreeSet<_> = cfg.categories.values().cloned().collect();
        for expected in [
            Category::DomainKnowledge,
            Category::ProjectDocs,
            Category::Sessions,
            Category::Troubleshooting,
            Category::ScanSync,
            Category::ClientIntake,
        ] {
            assert!(categories.contains(&expected), "missing {expected}");
        }
        assert_eq!(cfg.extensions, vec![".md", ".txt", ".json", ".jsonl"]);
    }

    #[test]
    fn extension_list_accepts_comma_string() {
        let cfg: Config = toml::from_str("extensions = \"md,  TXT\"\n").unwrap();
        assert_eq!(cfg.extensions, vec![".md", ".txt"]);
    }

    #[test]
    fn archive_roots_resolve_relative_to_input() {
        let (sql, rag) = ArchiveConfig::default().resolve(Path::new("/data/in"));
        assert_eq!(sql, PathBuf::from("/data/in/processed/sql"));
        assert_eq!(rag, PathBuf::from("/data/in/processed/rag"));
    }
}
