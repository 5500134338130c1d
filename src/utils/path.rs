//! Path helpers: config-relative resolution and URL → file lookup under a root.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Normalize a filesystem path to absolute form.
///
/// Tries `canonicalize()` first; a path that does not exist yet is joined
/// onto the current directory instead.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_against(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Map a request URL to a file below `root`.
///
/// Directories resolve to their `index.html`. Anything that escapes `root`,
/// through `..` or a symlink, resolves to nothing.
pub fn resolve_in_root(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);
    if clean.split('/').any(|seg| seg == "..") {
        return None;
    }

    let canonical = root.join(&clean).canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }
    None
}

/// Strip query and fragment, percent-decode, trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_resolve_against() {
        let base = Path::new("/project");
        assert_eq!(resolve_against(Path::new("mend.json"), base), PathBuf::from("/project/mend.json"));
        assert_eq!(resolve_against(Path::new("/etc/mend.json"), base), PathBuf::from("/etc/mend.json"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/docs/a%20b.html?x=1#top"), "docs/a b.html");
        assert_eq!(normalize_url("/"), "");
    }

    #[test]
    fn test_resolve_in_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("public");
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("docs/index.html"), "docs").unwrap();
        fs::write(root.join("docs/page one.html"), "page").unwrap();
        fs::write(dir.path().join("secret.txt"), "no").unwrap();

        let canon = |p: &str| root.join(p).canonicalize().unwrap();
        assert_eq!(resolve_in_root("/", &root), Some(canon("index.html")));
        assert_eq!(resolve_in_root("/docs/", &root), Some(canon("docs/index.html")));
        assert_eq!(
            resolve_in_root("/docs/page%20one.html?v=1", &root),
            Some(canon("docs/page one.html"))
        );
        assert_eq!(resolve_in_root("/missing.html", &root), None);
        assert_eq!(resolve_in_root("/../secret.txt", &root), None);
        assert_eq!(resolve_in_root("/docs/%2e%2e/%2e%2e/secret.txt", &root), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_in_root_symlink_escape() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("public");
        fs::create_dir(&root).unwrap();
        fs::write(dir.path().join("secret.txt"), "no").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("link.txt")).unwrap();
        assert_eq!(resolve_in_root("/link.txt", &root), None);
    }
}
