//! Path utility functions for normalization, comparison and display.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // At a root we can't go further up; keep the `..`
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
///
/// `/cache/pkg/1.0.0/../../../etc/passwd` is NOT under `/cache`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Render a path for console output, relative to `cwd` when it lives below it.
///
/// Paths outside `cwd` are shown as-is; `../../x` is harder to read than the
/// absolute path.
pub fn display_path(path: &Path, cwd: &Path) -> String {
    if is_path_under(path, cwd) {
        if let Some(relative) = pathdiff::diff_paths(path, cwd) {
            if !relative.as_os_str().is_empty() {
                return relative.display().to_string();
            }
        }
    }
    path.display().to_string()
}
