//! The external build collaborator.
//!
//! Packing is delegated to the .NET SDK; what comes back is the manifest the
//! pack step leaves in the project's intermediate output directory.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ManifestError;
use crate::runtime::Runtime;

const INTERMEDIATE_DIR: &str = "obj";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackOptions {
    pub configuration: Option<String>,
    /// Passed through to the build untouched.
    pub extra_args: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait Packer {
    fn pack(&self, project: &Path, options: &PackOptions) -> Result<()>;
}

/// Packs through the `dotnet` CLI on `PATH`.
pub struct DotnetCli;

impl DotnetCli {
    fn command(project: &Path, options: &PackOptions) -> Command {
        let mut cmd = Command::new("dotnet");
        cmd.arg("pack").arg(project).arg("-tl:off");
        if let Some(configuration) = &options.configuration {
            cmd.args(["-c", configuration]);
        }
        cmd.args(&options.extra_args);
        cmd
    }
}

impl Packer for DotnetCli {
    #[tracing::instrument(skip(self))]
    fn pack(&self, project: &Path, options: &PackOptions) -> Result<()> {
        let mut cmd = Self::command(project, options);
        debug!("Running {:?}", cmd);

        let status = cmd
            .status()
            .context("Failed to run `dotnet`. Is the .NET SDK installed?")?;
        if !status.success() {
            bail!("`dotnet pack {}` failed with {}", project.display(), status);
        }

        info!("Packed {}", project.display());
        Ok(())
    }
}

/// The most recently written manifest under the project's `obj/` directory.
#[tracing::instrument(skip(runtime))]
pub fn find_manifest<R: Runtime>(runtime: &R, project: &Path) -> Result<PathBuf> {
    let project_dir = project.parent().unwrap_or_else(|| Path::new(""));
    let intermediate = project_dir.join(INTERMEDIATE_DIR);
    let pattern = format!(
        "{}/**/*.nuspec",
        glob::Pattern::escape(&intermediate.to_string_lossy())
    );

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for path in runtime.glob(&pattern)? {
        let modified = runtime.modified(&path)?;
        debug!("Found manifest candidate {}", path.display());
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    match newest {
        Some((_, path)) => Ok(path),
        None => Err(ManifestError::NotFound(intermediate.join("*.nuspec")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::test_home;
    use mockall::predicate::eq;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_pack_command_line() {
        let options = PackOptions {
            configuration: Some("Release".into()),
            extra_args: vec!["-p:Version=1.2.3".into()],
        };
        let cmd = DotnetCli::command(Path::new("src/Lib/Lib.csproj"), &options);

        assert_eq!(cmd.get_program(), "dotnet");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["pack", "src/Lib/Lib.csproj", "-tl:off", "-c", "Release", "-p:Version=1.2.3"]
        );
    }

    #[test]
    fn test_pack_command_line_defaults() {
        let cmd = DotnetCli::command(Path::new("Lib.csproj"), &PackOptions::default());
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["pack", "Lib.csproj", "-tl:off"]);
    }

    #[test]
    fn test_find_manifest_picks_newest() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("Lib.csproj");
        fs::write(&project, "").unwrap();
        let debug = dir.path().join("obj/Debug/Lib.1.0.0.nuspec");
        let release = dir.path().join("obj/Release/Lib.1.0.0.nuspec");
        for path in [&debug, &release] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<package />").unwrap();
        }
        let older = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&debug)
            .unwrap()
            .set_modified(older)
            .unwrap();

        assert_eq!(find_manifest(&RealRuntime, &project).unwrap(), release);
    }

    #[test]
    fn test_find_manifest_compares_modification_times() {
        let mut runtime = MockRuntime::new();
        let project_dir = test_home().join("src").join("Lib");
        let older = project_dir.join("obj/Debug/Lib.1.0.0.nuspec");
        let newer = project_dir.join("obj/Release/Lib.1.0.0.nuspec");
        let now = SystemTime::now();

        let candidates = vec![newer.clone(), older.clone()];
        runtime
            .expect_glob()
            .withf(|pattern| pattern.ends_with("**/*.nuspec") && pattern.contains("obj"))
            .returning(move |_| Ok(candidates.clone()));
        runtime
            .expect_modified()
            .with(eq(older.clone()))
            .returning(move |_| Ok(now - Duration::from_secs(60)));
        runtime
            .expect_modified()
            .with(eq(newer.clone()))
            .returning(move |_| Ok(now));

        let found = find_manifest(&runtime, &project_dir.join("Lib.csproj")).unwrap();
        assert_eq!(found, newer);
    }

    #[test]
    fn test_find_manifest_without_pack_output() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("Lib.csproj");
        fs::write(&project, "").unwrap();

        let err = find_manifest(&RealRuntime, &project).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::NotFound(_))
        ));
    }
}
