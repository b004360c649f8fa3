//! Tool installation.
//!
//! A tool is not put in the packages folder; instead its command gets a shim
//! in the tools directory that is on the user's `PATH`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::cache::{ShimKind, tool_shim_path, tool_store_path};
use crate::error::ToolError;
use crate::linker::{LinkKind, Linker};
use crate::manifest::{PackageDescriptor, ToolSettings};
use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    pub command_name: String,
    pub shim: PathBuf,
    /// The build output the shim launches.
    pub target: PathBuf,
    pub kind: ShimKind,
}

/// Install (or replace) the shim for the tool described by `settings`.
#[tracing::instrument(skip(runtime, linker, descriptor, settings), fields(id = %descriptor.id))]
pub fn install_tool<R: Runtime>(
    runtime: &R,
    linker: &Linker<'_, R>,
    descriptor: &PackageDescriptor,
    manifest_path: &Path,
    settings: &ToolSettings,
    tools_root: &Path,
) -> Result<InstalledTool> {
    let command_name = settings.command_name.trim();
    if command_name.is_empty() || command_name.contains(['/', '\\']) || command_name == ".." {
        bail!("Invalid tool command name {:?}", settings.command_name);
    }

    let entry = descriptor
        .files
        .iter()
        .find(|file| file.target.eq_ignore_ascii_case(&settings.entry_point))
        .ok_or_else(|| ToolError::EntryPointNotFound(settings.entry_point.clone()))?;
    let target = entry.source.clone();
    debug!(
        "Entry point {} of {} resolves to {}",
        settings.entry_point,
        manifest_path.display(),
        target.display()
    );

    // An installed copy of the same package would shadow the shim.
    let store = tool_store_path(tools_root, &descriptor.id);
    if runtime.exists(&store) || runtime.is_symlink(&store) {
        debug!("Removing tool store {}", store.display());
        runtime
            .remove_dir_all(&store)
            .with_context(|| format!("Failed to remove {}", store.display()))?;
    }

    for kind in [ShimKind::Link, ShimKind::Script] {
        linker.remove_existing(&tool_shim_path(tools_root, command_name, kind))?;
    }

    runtime.create_dir_all(tools_root)?;

    let kind = if settings.runs_through_dotnet() {
        ShimKind::Script
    } else {
        ShimKind::Link
    };
    let shim = tool_shim_path(tools_root, command_name, kind);

    match kind {
        ShimKind::Link => linker.create_link(&shim, &target, LinkKind::Symbolic)?,
        ShimKind::Script => {
            runtime.write(&shim, shim_script(&target).as_bytes())?;
            runtime.set_permissions(&shim, 0o755)?;
        }
    }

    info!(
        "Installed tool {} at {} -> {}",
        command_name,
        shim.display(),
        target.display()
    );

    Ok(InstalledTool {
        command_name: command_name.to_string(),
        shim,
        target,
        kind,
    })
}

/// Script forwarding all arguments to `dotnet <assembly>`.
#[cfg(not(windows))]
fn shim_script(assembly: &Path) -> String {
    let quoted = assembly.display().to_string().replace('\'', r"'\''");
    format!("#!/bin/sh\nexec dotnet '{}' \"$@\"\n", quoted)
}

#[cfg(windows)]
fn shim_script(assembly: &Path) -> String {
    format!("@echo off\r\ndotnet \"{}\" %*\r\n", assembly.display())
}
