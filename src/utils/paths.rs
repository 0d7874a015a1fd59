//! Path helpers

use std::path::Path;

/// Render a path with `/` separators regardless of platform.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `path` relative to `root`, `/`-separated. Returns `None` when `path` is not
/// under `root` or is the root itself.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let normalized = normalize_path(rel);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = PathBuf::from("/repo");
        let path = root.join("src").join("main.rs");
        assert_eq!(relative_path(&root, &path).as_deref(), Some("src/main.rs"));
    }

    #[test]
    fn root_itself_has_no_relative_path() {
        let root = PathBuf::from("/repo");
        assert_eq!(relative_path(&root, &root), None);
        assert_eq!(relative_path(&root, Path::new("/elsewhere/x")), None);
    }
}
