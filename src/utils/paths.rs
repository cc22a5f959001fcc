//! Path normalization

use std::path::Path;

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// True when any component of `relative` starts with a dot.
pub fn has_hidden_component(relative: &Path) -> bool {
    relative.components().any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_components_detected_anywhere() {
        assert!(has_hidden_component(Path::new(".cache/a.md")));
        assert!(has_hidden_component(Path::new("notes/.draft.md")));
        assert!(!has_hidden_component(Path::new("notes/draft.md")));
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_path("a\\b\\c.md"), "a/b/c.md");
    }
}
