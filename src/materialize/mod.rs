//! Package materialization.
//!
//! Rebuilds a package's directory in the global packages folder so restore
//! treats it as installed, with every file linked back to the build output.

mod reference;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cache::{
    is_library_payload, manifest_file_name, metadata_file_name, package_cache_root,
    target_destination,
};
use crate::error::ManifestError;
use crate::linker::{LinkKind, Linker};
use crate::manifest::PackageDescriptor;
use crate::runtime::Runtime;

pub use reference::package_reference;

/// The `.nupkg.metadata` record restore looks for in a package directory.
///
/// There is no real archive behind a linked package, so the hash and
/// provenance are always null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: u32,
    pub content_hash: Option<String>,
    pub source: Option<String>,
}

impl CacheMetadata {
    pub const FORMAT_VERSION: u32 = 2;

    pub fn stub() -> Self {
        Self {
            version: Self::FORMAT_VERSION,
            content_hash: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFile {
    pub destination: PathBuf,
    pub source: PathBuf,
    pub kind: LinkKind,
}

/// What a successful materialization produced.
#[derive(Debug)]
pub struct Materialized {
    pub root: PathBuf,
    pub links: Vec<LinkedFile>,
}

/// Recreate the cache entry for `descriptor` under `packages_root`.
///
/// `manifest_path` is linked into the entry as-is, so it should be absolute.
/// Target paths are validated before the old entry is removed; after that
/// the first link failure aborts and is returned.
#[tracing::instrument(
    skip(runtime, linker, descriptor),
    fields(id = %descriptor.id, version = %descriptor.version)
)]
pub fn materialize<R: Runtime>(
    runtime: &R,
    linker: &Linker<'_, R>,
    descriptor: &PackageDescriptor,
    manifest_path: &Path,
    packages_root: &Path,
) -> Result<Materialized> {
    let root = package_cache_root(packages_root, &descriptor.id, &descriptor.version);

    let planned = descriptor
        .files
        .iter()
        .map(|file| {
            let destination = target_destination(&root, &file.target)?;
            let kind = if is_library_payload(&file.target) {
                LinkKind::Hard
            } else {
                LinkKind::Symbolic
            };
            Ok(LinkedFile {
                destination,
                source: file.source.clone(),
                kind,
            })
        })
        .collect::<Result<Vec<_>, ManifestError>>()?;

    if runtime.exists(&root) || runtime.is_symlink(&root) {
        debug!("Removing previous cache entry {}", root.display());
        runtime
            .remove_dir_all(&root)
            .with_context(|| format!("Failed to clear {}", root.display()))?;
    }
    runtime.create_dir_all(&root)?;

    let metadata = serde_json::to_string(&CacheMetadata::stub())?;
    runtime.write(&root.join(metadata_file_name(&descriptor.id)), metadata.as_bytes())?;

    linker.create_link(
        &root.join(manifest_file_name(&descriptor.id)),
        manifest_path,
        LinkKind::Symbolic,
    )?;

    for link in &planned {
        if let Some(parent) = link.destination.parent() {
            runtime.create_dir_all(parent)?;
        }
        linker.create_link(&link.destination, &link.source, link.kind)?;
    }

    info!(
        "Materialized {} {} at {} ({} files)",
        descriptor.id,
        descriptor.version,
        root.display(),
        planned.len()
    );

    Ok(Materialized {
        root,
        links: planned,
    })
}
