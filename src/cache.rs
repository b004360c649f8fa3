//! Cache path resolution.
//!
//! Pure functions computing where the package manager expects things on
//! disk. Ids and versions are lower-cased: the global packages folder is
//! keyed by lower-case names and restore will not find mixed-case entries.

use std::path::{Component, Path, PathBuf};

use crate::error::ManifestError;

/// Extension of the cache metadata stub written next to each package.
pub const METADATA_EXTENSION: &str = ".nupkg.metadata";
/// Extension of the manifest linked into each package directory.
pub const MANIFEST_EXTENSION: &str = ".nuspec";
/// Directory under the tool shim root holding per-tool package stores.
pub const TOOL_STORE_DIR: &str = ".store";
/// First path component of compiled binary payloads inside a package.
pub const LIBRARY_PAYLOAD_DIR: &str = "lib";

/// How a tool shim is materialized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimKind {
    /// A link to a native executable.
    Link,
    /// A small script forwarding to a runner (e.g. `dotnet <dll>`).
    Script,
}

/// `<packages_root>/<id lower>/<version lower>`
pub fn package_cache_root(packages_root: &Path, id: &str, version: &str) -> PathBuf {
    packages_root
        .join(id.to_lowercase())
        .join(version.to_lowercase())
}

pub fn metadata_file_name(id: &str) -> String {
    format!("{}{}", id.to_lowercase(), METADATA_EXTENSION)
}

pub fn manifest_file_name(id: &str) -> String {
    format!("{}{}", id.to_lowercase(), MANIFEST_EXTENSION)
}

/// Path of the shim for `command_name` under `shim_root`.
///
/// On Windows a link shim needs `.exe` and a script shim `.cmd` to be found
/// on `PATH`; elsewhere the bare command name is used for both.
pub fn tool_shim_path(shim_root: &Path, command_name: &str, kind: ShimKind) -> PathBuf {
    let file_name = if cfg!(windows) {
        match kind {
            ShimKind::Link => format!("{}.exe", command_name),
            ShimKind::Script => format!("{}.cmd", command_name),
        }
    } else {
        command_name.to_string()
    };
    shim_root.join(file_name)
}

/// `<shim_root>/.store/<id lower>`
pub fn tool_store_path(shim_root: &Path, id: &str) -> PathBuf {
    shim_root.join(TOOL_STORE_DIR).join(id.to_lowercase())
}

/// Normalize a package-relative target to `/` separators.
///
/// Manifests generated on Windows use `\`, which would otherwise become part
/// of the file name on Unix.
pub fn normalize_target(target: &str) -> String {
    target
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a target is a compiled payload that must be hard linked.
pub fn is_library_payload(target: &str) -> bool {
    let normalized = normalize_target(target);
    match normalized.split_once('/') {
        Some((first, _)) => first.eq_ignore_ascii_case(LIBRARY_PAYLOAD_DIR),
        None => false,
    }
}

/// Whether a declared target would land outside the package root.
///
/// Checked on the target as written: a rooted `/etc/x` or `C:\x` must be
/// rejected, not re-rooted by [`normalize_target`].
pub fn target_escapes_root(target: &str) -> bool {
    let bytes = target.trim_start().as_bytes();
    let rooted = matches!(bytes.first(), Some(b'/' | b'\\'))
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':');

    let normalized = normalize_target(target);
    rooted
        || normalized.is_empty()
        || Path::new(&normalized)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
}

/// Join a package-relative target under `root`, refusing anything that
/// would land outside it.
pub fn target_destination(root: &Path, target: &str) -> Result<PathBuf, ManifestError> {
    if target_escapes_root(target) {
        return Err(ManifestError::InvalidTargetPath(target.to_string()));
    }
    Ok(root.join(normalize_target(target)))
}
