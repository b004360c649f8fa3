//! Package manifest reading.
//!
//! Turns a `.nuspec` produced by the build into a [`PackageDescriptor`].
//! Package types are resolved here, once, into the closed [`PackageKind`]
//! variant; anything the linker does not know how to lay out is rejected
//! before any cache directory is touched.

mod nuspec;
mod tool_settings;
mod version;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;

use crate::cache::{normalize_target, target_escapes_root};
use crate::error::ManifestError;
use crate::runtime::Runtime;

pub use tool_settings::{TOOL_SETTINGS_FILE, ToolSettings, read_tool_settings};
pub use version::normalize_version;

use nuspec::Nuspec;

/// The shape of a package, which decides where it gets materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Referenced by other projects; lives in the global packages folder.
    /// `sdk` marks an MSBuild project SDK.
    Library { sdk: bool },
    /// A globally installed command-line tool.
    Tool,
}

/// A file the package ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Build output location.
    pub source: PathBuf,
    /// Location relative to the package root, `/`-separated.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub id: String,
    /// Normalized version; the cache entry is keyed by it.
    pub version: String,
    /// The version as the manifest declares it.
    pub declared_version: String,
    pub kind: PackageKind,
    pub development_dependency: bool,
    pub files: Vec<ManifestFile>,
}

/// Read and validate the manifest at `path`.
#[tracing::instrument(skip(runtime))]
pub fn read<R: Runtime>(runtime: &R, path: &Path) -> Result<PackageDescriptor> {
    if !runtime.exists(path) {
        return Err(ManifestError::NotFound(path.to_path_buf()).into());
    }

    let content = runtime.read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let descriptor = parse(&content, path, base_dir)?;

    debug!(
        "Read manifest {} {} ({:?}, {} files)",
        descriptor.id,
        descriptor.version,
        descriptor.kind,
        descriptor.files.len()
    );
    Ok(descriptor)
}

fn parse(content: &str, path: &Path, base_dir: &Path) -> Result<PackageDescriptor, ManifestError> {
    let parse_error = |reason: String| ManifestError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let nuspec = Nuspec::parse(content).map_err(|e| parse_error(e.to_string()))?;
    let metadata = nuspec.metadata;

    let id = non_empty(metadata.id).ok_or_else(|| parse_error("missing package id".into()))?;
    let declared_version =
        non_empty(metadata.version).ok_or_else(|| parse_error("missing package version".into()))?;
    let version = normalize_version(&declared_version)
        .ok_or_else(|| parse_error(format!("invalid package version {:?}", declared_version)))?;

    let type_names: Vec<String> = metadata
        .package_types
        .map(|types| types.entries.into_iter().map(|t| t.name).collect())
        .unwrap_or_default();
    let kind = resolve_kind(&type_names)?;

    let development_dependency = metadata
        .development_dependency
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

    let files = nuspec
        .files
        .map(|files| files.entries)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            let source = base_dir.join(native_separators(&entry.src));
            let target = match entry.target {
                Some(target) if target_escapes_root(&target) => {
                    return Err(ManifestError::InvalidTargetPath(target));
                }
                Some(target) => normalize_target(&target),
                // NuGet places a file without a target at the package root
                None => source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| parse_error(format!("file entry {:?} has no name", entry.src)))?,
            };
            Ok(ManifestFile { source, target })
        })
        .collect::<Result<Vec<_>, ManifestError>>()?;

    Ok(PackageDescriptor {
        id,
        version,
        declared_version,
        kind,
        development_dependency,
        files,
    })
}

fn native_separators(src: &str) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(src)
    } else {
        PathBuf::from(src.replace('\\', "/"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map declared package type names onto a [`PackageKind`].
///
/// Names compare case-insensitively. No declaration at all means a plain
/// library; a tool declaration wins over any other recognized type.
fn resolve_kind(names: &[String]) -> Result<PackageKind, ManifestError> {
    let mut tool = false;
    let mut sdk = false;

    for name in names {
        let name = name.trim();
        if name.eq_ignore_ascii_case("DotnetTool") || name.eq_ignore_ascii_case("tool") {
            tool = true;
        } else if name.eq_ignore_ascii_case("MSBuildSdk") {
            sdk = true;
        } else if name.eq_ignore_ascii_case("Dependency") || name.eq_ignore_ascii_case("library") {
            // The default type
        } else {
            return Err(ManifestError::UnsupportedPackageType(name.to_string()));
        }
    }

    Ok(if tool {
        PackageKind::Tool
    } else {
        PackageKind::Library { sdk }
    })
}
