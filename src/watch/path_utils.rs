// src/watch/path_utils.rs

//! Path normalisation shared by the watcher and pipeline sources.

use std::path::Path;

/// Render a path with forward slashes.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `path` relative to `root`, with forward slashes.
///
/// Falls back to comparing canonicalized paths, since notify may report a
/// different absolute prefix for the same directory (symlinked temp dirs on
/// macOS, for instance). Returns `None` for paths outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_path(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(slash_path)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn strips_root_prefix() {
        let root = PathBuf::from("/project");
        let path = root.join("less").join("site.less");
        assert_eq!(relative_str(&root, &path).as_deref(), Some("less/site.less"));
    }

    #[test]
    fn outside_root_is_none() {
        let root = PathBuf::from("/definitely/not/here");
        assert_eq!(relative_str(&root, Path::new("/elsewhere/file.js")), None);
    }
}
