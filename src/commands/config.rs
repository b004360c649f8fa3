use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::linker::LinkMode;
use crate::runtime::Runtime;

/// Where packages and tools are put, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub packages_root: PathBuf,
    pub tools_root: PathBuf,
    pub copy: bool,
}

impl Config {
    pub fn new<R: Runtime>(
        runtime: &R,
        packages_root: Option<PathBuf>,
        tools_root: Option<PathBuf>,
        copy: bool,
    ) -> Result<Self> {
        let packages_root = match packages_root {
            Some(path) => path,
            None => default_packages_root(runtime)?,
        };
        let tools_root = match tools_root {
            Some(path) => path,
            None => default_tools_root(runtime)?,
        };

        debug!(
            "Using packages root {} and tools root {}",
            packages_root.display(),
            tools_root.display()
        );

        Ok(Self {
            packages_root,
            tools_root,
            copy,
        })
    }

    /// Config rooted entirely under `root`.
    pub fn for_test(root: &Path) -> Self {
        Self {
            packages_root: root.join("packages"),
            tools_root: root.join("tools"),
            copy: false,
        }
    }

    pub fn link_mode(&self) -> LinkMode {
        if self.copy {
            LinkMode::Copy
        } else {
            LinkMode::Link
        }
    }
}

/// The global packages folder: `NUGET_PACKAGES`, or `~/.nuget/packages`.
#[tracing::instrument(skip(runtime))]
pub fn default_packages_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Some(path) = non_empty_env(runtime, "NUGET_PACKAGES") {
        return Ok(PathBuf::from(path));
    }
    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home_dir.join(".nuget").join("packages"))
}

/// The global tools folder under `DOTNET_CLI_HOME`, or under the home directory.
#[tracing::instrument(skip(runtime))]
pub fn default_tools_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let base = match non_empty_env(runtime, "DOTNET_CLI_HOME") {
        Some(path) => PathBuf::from(path),
        None => runtime
            .home_dir()
            .context("Could not find home directory")?,
    };
    Ok(base.join(".dotnet").join("tools"))
}

fn non_empty_env<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
