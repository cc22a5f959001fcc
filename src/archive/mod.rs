//! Move routed source files into the processed area.
//!
//! Layout: `<sql_root | rag_root>/<category>/<file name>`. Collisions get a
//! `_<YYYYMMDD_HHMMSS>[_n]` suffix before the extension; nothing is ever
//! overwritten.

use crate::domain::{Category, CleanupStats, Destination, RawFile, RouteDecision, RoutedItem};
use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to create archive root {}: {source}", .path.display())]
    CreateRoot { path: PathBuf, source: io::Error },

    #[error("failed to create {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move { from: PathBuf, to: PathBuf, source: io::Error },

    #[error("archive lock poisoned")]
    Poisoned,
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Moved { from: PathBuf, to: PathBuf },
    /// Dry run: where the file would have gone.
    Planned { from: PathBuf, to: PathBuf },
    Skipped { reason: String },
    Failed { reason: String },
}

impl CleanupOutcome {
    pub fn target(&self) -> Option<&Path> {
        match self {
            CleanupOutcome::Moved { to, .. } | CleanupOutcome::Planned { to, .. } => Some(to),
            _ => None,
        }
    }
}

pub struct Archiver {
    sql_root: PathBuf,
    rag_root: PathBuf,
    dry_run: bool,
    /// Targets handed out this run. Held across check-then-move.
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Archiver {
    /// Create the archive roots up front; failure here aborts the run.
    pub fn new(sql_root: PathBuf, rag_root: PathBuf, dry_run: bool) -> Result<Self, ArchiveError> {
        if !dry_run {
            for root in [&sql_root, &rag_root] {
                fs::create_dir_all(root)
                    .map_err(|source| ArchiveError::CreateRoot { path: root.clone(), source })?;
            }
        }
        Ok(Self { sql_root, rag_root, dry_run, claimed: Mutex::new(HashSet::new()) })
    }

    /// Directory a destination/category pair archives into.
    pub fn category_dir(&self, destination: Destination, category: &Category) -> Option<PathBuf> {
        let root = match destination {
            Destination::Sql => &self.sql_root,
            Destination::Rag | Destination::Both => &self.rag_root,
            Destination::Skip => return None,
        };
        Some(root.join(category.as_str()))
    }

    pub fn archive(&self, file: &RawFile, route: &RouteDecision) -> CleanupOutcome {
        let Some(dir) = self.category_dir(route.destination, &file.category) else {
            return CleanupOutcome::Skipped { reason: route.reason.clone() };
        };
        match self.place(&file.path, &dir) {
            Ok(to) if self.dry_run => CleanupOutcome::Planned { from: file.path.clone(), to },
            Ok(to) => {
                tracing::debug!(from = %file.path.display(), to = %to.display(), "archived");
                CleanupOutcome::Moved { from: file.path.clone(), to }
            }
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = %err, "source not cleaned up");
                CleanupOutcome::Failed { reason: format!("not cleaned up: {err}") }
            }
        }
    }

    pub fn archive_all(&self, items: &[RoutedItem]) -> (Vec<CleanupOutcome>, CleanupStats) {
        let mut stats = CleanupStats::default();
        let outcomes: Vec<CleanupOutcome> = items
            .iter()
            .map(|item| {
                let outcome = self.archive(item.file(), &item.route);
                match &outcome {
                    CleanupOutcome::Moved { .. } => stats.moved += 1,
                    CleanupOutcome::Planned { .. } => stats.planned += 1,
                    CleanupOutcome::Skipped { .. } => stats.skipped += 1,
                    CleanupOutcome::Failed { .. } => stats.failed += 1,
                }
                outcome
            })
            .collect();
        (outcomes, stats)
    }

    /// Pick a free target in `dir` and (unless dry-running) move `from` there.
    fn place(&self, from: &Path, dir: &Path) -> Result<PathBuf, ArchiveError> {
        let mut claimed = self.claimed.lock().map_err(|_| ArchiveError::Poisoned)?;
        let file_name = from.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("unnamed"));
        let target = unique_target(dir, &file_name, |p| p.exists() || claimed.contains(p));

        if !self.dry_run {
            fs::create_dir_all(dir)
                .map_err(|source| ArchiveError::CreateDir { path: dir.to_path_buf(), source })?;
            move_file(from, &target).map_err(|source| ArchiveError::Move {
                from: from.to_path_buf(),
                to: target.clone(),
                source,
            })?;
        }
        claimed.insert(target.clone());
        Ok(target)
    }
}

/// First free name for `file_name` in `dir`: as-is, then with a timestamp
/// suffix, then with a counter after the timestamp.
pub fn unique_target(dir: &Path, file_name: &Path, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let direct = dir.join(file_name);
    if !taken(&direct) {
        return direct;
    }
    let stem = file_name.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = file_name.extension().and_then(|e| e.to_str());
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let with_ext = |base: String| match ext {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    };

    let candidate = dir.join(with_ext(format!("{stem}_{stamp}")));
    if !taken(&candidate) {
        return candidate;
    }
    let mut n = 1usize;
    loop {
        let candidate = dir.join(with_ext(format!("{stem}_{stamp}_{n}")));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// `rename`, falling back to copy + remove across filesystems. A copy whose
/// source cannot be removed is deleted again so the file is archived at most
/// once.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if needs_copy_fallback(&err) => copy_then_remove(from, to),
        Err(err) => Err(err),
    }
}

fn needs_copy_fallback(err: &io::Error) -> bool {
    err.kind() == ErrorKind::CrossesDevices
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    if let Err(err) = fs::remove_file(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            tracing::warn!(path = %to.display(), error = %cleanup, "failed to remove partial archive copy");
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileFormat;
    use tempfile::TempDir;

    fn raw(path: PathBuf, category: Category) -> RawFile {
        RawFile {
            relative_path: path.file_name().unwrap().to_string_lossy().into_owned(),
            format: FileFormat::from_path(&path).unwrap(),
            path,
            category,
        }
    }

    fn rag_route() -> RouteDecision {
        RouteDecision {
            destination: Destination::Rag,
            reason: "troubleshooting knowledge".into(),
            sql_table: None,
            rag_collection: Some("troubleshooting-knowledge".into()),
            create_summary: false,
        }
    }

    #[test]
    fn moves_into_category_dir() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("troubleshooting/bug1.md");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "x").unwrap();

        let archiver = Archiver::new(
            tmp.path().join("processed/sql"),
            tmp.path().join("processed/rag"),
            false,
        )
        .unwrap();
        let outcome = archiver.archive(&raw(src.clone(), Category::Troubleshooting), &rag_route());
        let expected = tmp.path().join("processed/rag/troubleshooting/bug1.md");
        assert_eq!(outcome, CleanupOutcome::Moved { from: src.clone(), to: expected.clone() });
        assert!(!src.exists());
        assert!(expected.exists());
    }

    #[test]
    fn same_basename_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a/notes.md");
        let b = tmp.path().join("b/notes.md");
        for (path, body) in [(&a, "first"), (&b, "second")] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let archiver = Archiver::new(tmp.path().join("sql"), tmp.path().join("rag"), false).unwrap();
        let first = archiver.archive(&raw(a, Category::Sessions), &rag_route());
        let second = archiver.archive(&raw(b, Category::Sessions), &rag_route());

        let (first, second) = (first.target().unwrap(), second.target().unwrap());
        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
        let name = second.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("notes_") && name.ends_with(".md"), "got {name}");
    }

    #[test]
    fn dry_run_plans_without_touching_disk() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.json");
        fs::write(&src, "{}").unwrap();
        let archiver = Archiver::new(tmp.path().join("sql"), tmp.path().join("rag"), true).unwrap();
        let route = RouteDecision {
            destination: Destination::Sql,
            reason: "client intake with contact details".into(),
            sql_table: Some("people".into()),
            rag_collection: None,
            create_summary: false,
        };
        let file = raw(src.clone(), Category::ClientIntake);
        let first = archiver.archive(&file, &route);
        let second = archiver.archive(&file, &route);

        assert_eq!(first.target(), Some(tmp.path().join("sql/client_intake/x.json").as_path()));
        assert_ne!(first.target(), second.target());
        assert!(src.exists());
        assert!(!tmp.path().join("sql").exists());
    }

    #[test]
    fn skip_routes_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("dup.md");
        fs::write(&src, "x").unwrap();
        let archiver = Archiver::new(tmp.path().join("sql"), tmp.path().join("rag"), false).unwrap();
        let outcome = archiver
            .archive(&raw(src.clone(), Category::Sessions), &RouteDecision::skip("failed sanitization: duplicate content"));
        assert_eq!(
            outcome,
            CleanupOutcome::Skipped { reason: "failed sanitization: duplicate content".into() }
        );
        assert!(src.exists());
    }

    #[test]
    fn missing_source_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let archiver = Archiver::new(tmp.path().join("sql"), tmp.path().join("rag"), false).unwrap();
        let outcome = archiver.archive(&raw(tmp.path().join("gone.md"), Category::Sessions), &rag_route());
        match outcome {
            CleanupOutcome::Failed { reason } => assert!(reason.starts_with("not cleaned up:")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn counter_suffix_follows_timestamp() {
        let dir = Path::new("/archive");
        let taken = |p: &Path| !p.to_string_lossy().ends_with("_1.md");
        let target = unique_target(dir, Path::new("notes.md"), taken);
        let name = target.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("notes_") && name.ends_with("_1.md"), "got {name}");
    }

    #[test]
    fn only_cross_device_renames_fall_back_to_copy() {
        assert!(needs_copy_fallback(&io::Error::from(ErrorKind::CrossesDevices)));
        assert!(!needs_copy_fallback(&io::Error::from(ErrorKind::PermissionDenied)));
        assert!(!needs_copy_fallback(&io::Error::from(ErrorKind::NotFound)));
    }

    #[test]
    fn failed_move_leaves_no_copy_behind() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("missing.md");
        let to = tmp.path().join("archive.md");
        assert!(move_file(&from, &to).is_err());
        assert!(!to.exists());

        let src = tmp.path().join("note.md");
        fs::write(&src, "x").unwrap();
        let dest = tmp.path().join("copy.md");
        copy_then_remove(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "x");
    }
}
