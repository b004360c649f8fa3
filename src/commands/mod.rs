use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    build::{PackOptions, Packer, find_manifest},
    linker::Linker,
    manifest::{self, PackageKind, read_tool_settings},
    materialize::{Materialized, materialize, package_reference},
    runtime::{Runtime, display_path, normalize_path},
    tool::{InstalledTool, install_tool},
};

pub mod config;
pub mod project;
pub mod solution;

use config::Config;
use project::{is_solution_file, resolve_project_or_solution};
use solution::list_projects;

/// What one `nulink` invocation was asked to do.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Projects, solutions or directories. Empty means the current directory.
    pub paths: Vec<PathBuf>,
    /// Reuse the manifest the last pack left behind.
    pub no_build: bool,
    pub pack: PackOptions,
}

#[derive(Debug)]
pub enum LinkedPackage {
    Library(Materialized),
    Tool(InstalledTool),
}

#[derive(Debug)]
pub struct PackageOutcome {
    pub manifest: PathBuf,
    pub result: Result<LinkedPackage>,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub packages: Vec<PackageOutcome>,
}

impl BatchOutcome {
    pub fn any_failed(&self) -> bool {
        self.packages.iter().any(|p| p.result.is_err())
    }

    fn record(&mut self, manifest: PathBuf, result: Result<LinkedPackage>) {
        self.packages.push(PackageOutcome { manifest, result });
    }
}

/// Pack (unless told not to) and link every project named by `options`.
///
/// Discovery errors are returned; per-project failures are recorded in the
/// outcome and do not stop the remaining projects.
#[tracing::instrument(skip(runtime, packer, config))]
pub fn link<R: Runtime, P: Packer>(
    runtime: &R,
    packer: &P,
    config: &Config,
    options: &LinkOptions,
) -> Result<BatchOutcome> {
    let projects = collect_projects(runtime, &options.paths)?;
    let cwd = runtime.current_dir()?;

    let names: Vec<String> = projects.iter().map(|p| display_path(p, &cwd)).collect();
    println!("Packing {} project(s): {}", projects.len(), names.join(", "));
    if !options.pack.extra_args.is_empty() {
        println!("Additional arguments: {}", options.pack.extra_args.join(" "));
    }

    let mut manifests = Vec::new();
    let mut outcome = BatchOutcome::default();
    for project in &projects {
        match prepare_manifest(runtime, packer, project, options) {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => {
                println!("Failed to pack {}: {:#}", display_path(project, &cwd), e);
                outcome.record(project.clone(), Err(e));
            }
        }
    }

    outcome
        .packages
        .extend(link_manifests(runtime, config, &manifests).packages);
    Ok(outcome)
}

/// Expand command-line paths into a de-duplicated list of project files.
#[tracing::instrument(skip(runtime))]
pub fn collect_projects<R: Runtime>(runtime: &R, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let cwd = runtime.current_dir()?;
    let paths = if paths.is_empty() {
        vec![cwd.clone()]
    } else {
        paths.to_vec()
    };

    let mut projects: Vec<PathBuf> = Vec::new();
    for path in paths {
        let resolved = resolve_project_or_solution(runtime, &absolute(&cwd, &path))?;
        let found = if is_solution_file(&resolved) {
            list_projects(runtime, &resolved)?
        } else {
            vec![resolved]
        };

        for project in found {
            let project = normalize_path(&project);
            if project.extension().is_some_and(|ext| ext == "vcxproj") {
                debug!("Skipping C++ project {}", project.display());
                continue;
            }
            if !projects.contains(&project) {
                projects.push(project);
            }
        }
    }

    Ok(projects)
}

fn prepare_manifest<R: Runtime, P: Packer>(
    runtime: &R,
    packer: &P,
    project: &Path,
    options: &LinkOptions,
) -> Result<PathBuf> {
    if options.no_build {
        debug!("Skipping pack of {}", project.display());
    } else {
        packer.pack(project, &options.pack)?;
    }
    find_manifest(runtime, project)
}

/// Link every manifest in turn. A failure is reported and recorded, and the
/// batch moves on to the next manifest.
#[tracing::instrument(skip(runtime, config))]
pub fn link_manifests<R: Runtime>(
    runtime: &R,
    config: &Config,
    manifests: &[PathBuf],
) -> BatchOutcome {
    let linker = Linker::new(runtime, config.link_mode());
    let cwd = runtime.current_dir().ok();
    let shown = |path: &Path| match &cwd {
        Some(cwd) => display_path(path, cwd),
        None => path.display().to_string(),
    };

    let mut outcome = BatchOutcome::default();
    for manifest in manifests {
        println!("Linking {}", shown(manifest));
        let result = link_package(runtime, &linker, config, manifest);
        if let Err(e) = &result {
            warn!("Linking {} failed: {:#}", manifest.display(), e);
            println!("Failed to link {}: {:#}", shown(manifest), e);
        }
        outcome.record(manifest.clone(), result);
    }

    info!(
        "Linked {} of {} package(s)",
        outcome.packages.iter().filter(|p| p.result.is_ok()).count(),
        outcome.packages.len()
    );
    outcome
}

/// Read one manifest and link it as a library or install it as a tool.
#[tracing::instrument(skip(runtime, linker, config))]
pub fn link_package<R: Runtime>(
    runtime: &R,
    linker: &Linker<'_, R>,
    config: &Config,
    manifest_path: &Path,
) -> Result<LinkedPackage> {
    let manifest_path = absolute(&runtime.current_dir()?, manifest_path);
    let descriptor = manifest::read(runtime, &manifest_path)?;

    match descriptor.kind {
        PackageKind::Library { .. } => {
            let materialized = materialize(
                runtime,
                linker,
                &descriptor,
                &manifest_path,
                &config.packages_root,
            )?;
            println!(
                "Linked {} {} into {}",
                descriptor.id,
                descriptor.version,
                materialized.root.display()
            );
            println!("Reference it with:\n{}", package_reference(&descriptor));
            Ok(LinkedPackage::Library(materialized))
        }
        PackageKind::Tool => {
            let settings = read_tool_settings(runtime, &descriptor)?;
            let installed = install_tool(
                runtime,
                linker,
                &descriptor,
                &manifest_path,
                &settings,
                &config.tools_root,
            )?;
            println!(
                "Installed tool {}: {} -> {}",
                installed.command_name,
                installed.shim.display(),
                installed.target.display()
            );
            Ok(LinkedPackage::Tool(installed))
        }
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&cwd.join(path))
    }
}
