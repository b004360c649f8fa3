//! Link provider.
//!
//! [`Linker`] replaces whatever sits at a destination with a link (or, in
//! copy mode, a copy) of a build output, and reports each link it makes.

use std::fmt;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::error::LinkError;
use crate::runtime::{Runtime, display_path};

/// The kind of filesystem link to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Symbolic,
    Hard,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Symbolic => f.write_str("symbolic"),
            LinkKind::Hard => f.write_str("hard"),
        }
    }
}

/// Whether destinations are links to, or copies of, their sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    #[default]
    Link,
    Copy,
}

const PRIVILEGE_GUIDANCE: &str = "You don't have privileges to create a symlink.\n\
Make sure to enable Developer Mode in Windows \"For developers\" settings, \
or run from an elevated prompt.";

const CROSS_DEVICE_GUIDANCE: &str = "Hard links cannot span filesystems. \
Keep the build output and the packages folder on one volume, or rerun with --copy.";

pub struct Linker<'a, R: Runtime> {
    runtime: &'a R,
    mode: LinkMode,
}

impl<'a, R: Runtime> Linker<'a, R> {
    pub fn new(runtime: &'a R, mode: LinkMode) -> Self {
        Self { runtime, mode }
    }

    /// Create `destination` as a `kind` link to `source`.
    ///
    /// Any existing entry at `destination` is removed first, including a
    /// dangling symlink left over from a previous run.
    #[tracing::instrument(skip(self))]
    pub fn create_link(&self, destination: &Path, source: &Path, kind: LinkKind) -> Result<()> {
        self.remove_existing(destination)?;

        match self.mode {
            LinkMode::Copy => {
                self.runtime.copy(source, destination)?;
                println!(
                    "Copied {} from {}",
                    self.display(destination),
                    self.display(source)
                );
                return Ok(());
            }
            LinkMode::Link => {}
        }

        let linked = match kind {
            LinkKind::Symbolic => self.runtime.symlink(source, destination),
            LinkKind::Hard => self.runtime.hard_link(source, destination),
        };

        if let Err(e) = linked {
            match e.downcast_ref::<LinkError>() {
                Some(LinkError::InsufficientPrivilege { .. }) => {
                    warn!("Symlink creation denied at {}", destination.display());
                    eprintln!("{}", PRIVILEGE_GUIDANCE);
                    if self.runtime.is_privileged() {
                        eprintln!(
                            "The process is elevated, so the policy is enforced by the system."
                        );
                    }
                }
                Some(LinkError::Failed { kind: LinkKind::Hard, error, .. })
                    if error.kind() == io::ErrorKind::CrossesDevices =>
                {
                    eprintln!("{}", CROSS_DEVICE_GUIDANCE);
                }
                _ => {}
            }
            return Err(e);
        }

        info!(
            "Linked {} to {} ({})",
            destination.display(),
            source.display(),
            kind
        );
        println!(
            "Linked {} to {} ({})",
            self.display(destination),
            self.display(source),
            kind
        );
        Ok(())
    }

    /// Remove a file or symlink at `path`, if any. Directories are left alone.
    pub fn remove_existing(&self, path: &Path) -> Result<()> {
        if self.runtime.is_symlink(path) || (self.runtime.exists(path) && !self.runtime.is_dir(path))
        {
            debug!("Removing existing {}", path.display());
            self.runtime
                .remove_file(path)
                .with_context(|| format!("Failed to replace {}", path.display()))?;
        }
        Ok(())
    }

    fn display(&self, path: &Path) -> String {
        match self.runtime.current_dir() {
            Ok(cwd) => display_path(path, &cwd),
            Err(_) => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::{configure_mock_runtime_basics, test_home};
    use mockall::predicate::eq;
    use std::io;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_link_kind_display() {
        assert_eq!(LinkKind::Symbolic.to_string(), "symbolic");
        assert_eq!(LinkKind::Hard.to_string(), "hard");
    }

    #[test]
    fn test_create_link_removes_existing_file_first() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);

        let dest = test_home().join("cache/pkg/1.0.0/build/Pkg.props");
        let src = test_home().join("src/Pkg/build/Pkg.props");

        let mut seq = mockall::Sequence::new();
        runtime
            .expect_is_symlink()
            .with(eq(dest.clone()))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(dest.clone()))
            .returning(|_| true);
        runtime
            .expect_is_dir()
            .with(eq(dest.clone()))
            .returning(|_| false);
        runtime
            .expect_remove_file()
            .with(eq(dest.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        runtime
            .expect_symlink()
            .with(eq(src.clone()), eq(dest.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let linker = Linker::new(&runtime, LinkMode::Link);
        linker.create_link(&dest, &src, LinkKind::Symbolic).unwrap();
    }

    #[test]
    fn test_create_link_removes_dangling_symlink() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);

        let dest = test_home().join("cache/pkg/1.0.0/lib/net8.0/Pkg.dll");
        let src = test_home().join("src/Pkg/bin/Pkg.dll");

        // A dangling link does not "exist" but must still be cleared
        runtime.expect_is_symlink().returning(|_| true);
        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_remove_file()
            .with(eq(dest.clone()))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_hard_link()
            .with(eq(src.clone()), eq(dest.clone()))
            .times(1)
            .returning(|_, _| Ok(()));

        let linker = Linker::new(&runtime, LinkMode::Link);
        linker.create_link(&dest, &src, LinkKind::Hard).unwrap();
    }

    #[test]
    fn test_insufficient_privilege_is_propagated_not_downgraded() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);

        let dest = PathBuf::from("cache/pkg.nuspec");
        runtime.expect_is_symlink().returning(|_| false);
        runtime.expect_exists().returning(|_| false);
        runtime.expect_symlink().returning(|_, link| {
            Err(LinkError::InsufficientPrivilege {
                destination: link.to_path_buf(),
                error: io::Error::from(io::ErrorKind::PermissionDenied),
            }
            .into())
        });
        // Never fall back to copying
        runtime.expect_copy().never();

        let linker = Linker::new(&runtime, LinkMode::Link);
        let err = linker
            .create_link(&dest, Path::new("obj/pkg.nuspec"), LinkKind::Symbolic)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::InsufficientPrivilege { .. })
        ));
    }

    #[test]
    fn test_copy_mode_copies_instead_of_linking() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let src = dir.path().join("Pkg.dll");
        let dest = dir.path().join("copy.dll");
        runtime.write(&src, b"payload").unwrap();
        runtime.write(&dest, b"stale").unwrap();

        let linker = Linker::new(&runtime, LinkMode::Copy);
        linker.create_link(&dest, &src, LinkKind::Hard).unwrap();

        assert!(!runtime.is_symlink(&dest));
        assert_eq!(runtime.read_to_string(&dest).unwrap(), "payload");
    }

    #[cfg_attr(
        nulink_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set NULINK_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_relink_over_previous_run_artifact() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.props");
        let second = dir.path().join("second.props");
        let dest = dir.path().join("Pkg.props");
        runtime.write(&first, b"1").unwrap();
        runtime.write(&second, b"2").unwrap();

        let linker = Linker::new(&runtime, LinkMode::Link);
        linker.create_link(&dest, &first, LinkKind::Symbolic).unwrap();
        linker.create_link(&dest, &second, LinkKind::Symbolic).unwrap();

        assert_eq!(std::fs::read_link(&dest).unwrap(), second);
    }
}
