//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - real paths (canonicalize + fallback)
//! - `absolute_path` - lexical absolute paths, no filesystem access
//! - `resolve_path` - resolve relative paths against a base directory

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to [`absolute_path`] when the path does not exist.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolute_path(path))
}

/// Make a path absolute without touching the filesystem.
///
/// Relative paths are joined onto the current directory, then `.` is dropped
/// and `..` pops the previous component. Symlinks are left alone, so two
/// paths compare equal only when they spell the same location.
///
/// # Example
/// ```ignore
/// absolute_path(Path::new("/site/content/./css/../_b.scss"))
/// // -> /site/content/_b.scss
/// ```
pub fn absolute_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a possibly relative path against `base`.
///
/// Always returns an absolute path.
#[inline]
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        absolute_path(path)
    } else {
        absolute_path(&base.join(path))
    }
}
