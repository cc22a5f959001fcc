//! Category-directory scanner

use crate::domain::{default_category_dirs, Category, DiscoveryStats, FileFormat, RawFile};
use crate::domain::config::{normalize_extension, DEFAULT_EXTENSIONS};
use crate::utils::{has_hidden_component, normalize_path};
use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Discovered files, grouped by category and sorted by path.
pub type Discovery = BTreeMap<Category, Vec<RawFile>>;

/// Walks each configured category directory under an input root.
pub struct FileScanner {
    root_path: PathBuf,
    categories: BTreeMap<String, Category>,
    include_extensions: Vec<String>,
    exclude_globs: Vec<String>,
    follow_symlinks: bool,
    stats: DiscoveryStats,
}

impl FileScanner {
    /// Create a new FileScanner with the default category mapping and extensions.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            categories: default_category_dirs(),
            include_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            stats: DiscoveryStats::default(),
        }
    }

    /// Set the directory name → category mapping
    pub fn categories(mut self, categories: BTreeMap<String, Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Set file extensions to include (e.g., ".md", "json")
    pub fn include_extensions(mut self, extensions: Vec<String>) -> Self {
        self.include_extensions = extensions.iter().map(|e| normalize_extension(e)).collect();
        self
    }

    /// Set glob patterns to exclude, matched against paths relative to the category directory
    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    /// Set whether to follow symbolic links
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    fn build_exclude_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    fn should_include_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext_with_dot = normalize_extension(ext);
        self.include_extensions.contains(&ext_with_dot)
            && FileFormat::from_extension(&ext_with_dot).is_some()
    }

    /// Scan every category directory.
    ///
    /// Missing directories yield an empty list for their category. Paths inside
    /// a category directory whose segments start with `.` are never returned.
    pub fn scan(&mut self) -> Result<Discovery> {
        self.stats = DiscoveryStats::default();
        let exclude_globset = self.build_exclude_globset()?;
        let mut discovery: Discovery = BTreeMap::new();

        for (dir_name, category) in &self.categories {
            let files = discovery.entry(category.clone()).or_default();
            let dir_path = self.root_path.join(dir_name);
            if !dir_path.is_dir() {
                tracing::debug!(dir = %dir_path.display(), "category directory missing");
                self.stats.directories_missing += 1;
                continue;
            }
            self.stats.directories_scanned += 1;

            let mut builder = WalkBuilder::new(&dir_path);
            builder
                .standard_filters(false)
                .follow_links(self.follow_symlinks)
                // Prune hidden directories below the category root; the root itself may be hidden.
                .filter_entry(|entry| {
                    entry.depth() == 0
                        || !entry.file_type().is_some_and(|t| t.is_dir())
                        || !entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
                });

            for entry_result in builder.build() {
                let entry = match entry_result {
                    Ok(e) => e,
                    Err(err) => {
                        tracing::warn!("skipping unreadable entry under {}: {}", dir_path.display(), err);
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                self.stats.files_seen += 1;

                let path = entry.path();
                let Ok(relative) = path.strip_prefix(&dir_path) else {
                    continue;
                };
                if has_hidden_component(relative) {
                    self.stats.files_skipped_hidden += 1;
                    continue;
                }
                let rel_path = normalize_path(&relative.to_string_lossy());
                if exclude_globset.is_match(&rel_path) {
                    self.stats.files_skipped_glob += 1;
                    continue;
                }
                if !self.should_include_extension(path) {
                    self.stats.files_skipped_extension += 1;
                    continue;
                }
                let Some(format) = FileFormat::from_path(path) else {
                    self.stats.files_skipped_extension += 1;
                    continue;
                };

                files.push(RawFile {
                    path: path.to_path_buf(),
                    relative_path: rel_path,
                    category: category.clone(),
                    format,
                });
            }
        }

        for (category, files) in discovery.iter_mut() {
            files.sort_by(|a, b| a.path.cmp(&b.path));
            files.dedup_by(|a, b| a.path == b.path);
            self.stats.files_included += files.len();
            self.stats.files_by_category.insert(category.to_string(), files.len());
        }

        Ok(discovery)
    }

    /// Get scanning statistics
    pub fn stats(&self) -> &DiscoveryStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scanner_groups_by_category_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "troubleshooting/b.md", "# B");
        write(root, "troubleshooting/a.md", "# A");
        write(root, "troubleshooting/nested/c.txt", "c");
        write(root, "sync/scan.json", "{}");

        let mut scanner = FileScanner::new(root.to_path_buf());
        let found = scanner.scan().unwrap();

        let trouble: Vec<&str> = found[&Category::Troubleshooting]
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        assert_eq!(trouble, vec!["a.md", "b.md", "nested/c.txt"]);
        assert_eq!(found[&Category::ScanSync][0].format, FileFormat::Json);
    }

    #[test]
    fn test_missing_category_dirs_yield_empty_lists() {
        let temp_dir = TempDir::new().unwrap();
        let mut scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let found = scanner.scan().unwrap();

        assert!(found[&Category::ClientIntake].is_empty());
        assert!(found[&Category::DomainKnowledge].is_empty());
        assert_eq!(scanner.stats().directories_scanned, 0);
        assert!(scanner.stats().directories_missing > 0);
    }

    #[test]
    fn test_hidden_paths_and_foreign_extensions_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "sessions/.hidden.md", "secret");
        write(root, "sessions/.cache/x.md", "cached");
        write(root, "sessions/log.md", "visible");
        write(root, "sessions/image.png", "png");

        let mut scanner = FileScanner::new(root.to_path_buf());
        let found = scanner.scan().unwrap();

        let sessions: Vec<&str> =
            found[&Category::Sessions].iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(sessions, vec!["log.md"]);
        assert_eq!(scanner.stats().files_skipped_hidden, 1);
        assert_eq!(scanner.stats().files_skipped_extension, 1);
    }

    #[test]
    fn test_several_directories_merge_into_one_category() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "sessions/one.md", "1");
        write(root, "session-notes/two.md", "2");

        let mut scanner = FileScanner::new(root.to_path_buf());
        let found = scanner.scan().unwrap();
        assert_eq!(found[&Category::Sessions].len(), 2);
        assert_eq!(scanner.stats().files_by_category["sessions"], 2);
    }

    #[test]
    fn test_exclude_globs_and_extension_override() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "projects-docs/keep.md", "k");
        write(root, "projects-docs/drafts/skip.md", "s");
        write(root, "projects-docs/data.json", "{}");

        let mut scanner = FileScanner::new(root.to_path_buf())
            .include_extensions(vec!["md".to_string()])
            .exclude_globs(vec!["drafts/**".to_string()]);
        let found = scanner.scan().unwrap();

        let docs: Vec<&str> =
            found[&Category::ProjectDocs].iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(docs, vec!["keep.md"]);
        assert_eq!(scanner.stats().files_skipped_glob, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_only_followed_on_request() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "shared/linked.md", "# Linked");
        write(root, "sessions/own.md", "# Own");
        std::os::unix::fs::symlink(root.join("shared"), root.join("sessions/shared")).unwrap();

        let mut plain = FileScanner::new(root.to_path_buf());
        let found = plain.scan().unwrap();
        assert_eq!(found[&Category::Sessions].len(), 1);

        let mut following = FileScanner::new(root.to_path_buf()).follow_symlinks(true);
        let found = following.scan().unwrap();
        let names: Vec<&str> =
            found[&Category::Sessions].iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["own.md", "shared/linked.md"]);
    }
}
