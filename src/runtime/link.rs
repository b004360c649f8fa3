//! Platform link primitives.
//!
//! One implementation per platform family, selected at compile time. Errors
//! are translated into [`LinkError`] so callers can react to privilege and
//! capability failures without inspecting OS error codes themselves.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use super::RealRuntime;
use crate::error::LinkError;
use crate::linker::LinkKind;

/// `ERROR_PRIVILEGE_NOT_HELD`, returned by `CreateSymbolicLinkW` when the
/// user lacks `SeCreateSymbolicLinkPrivilege` and Developer Mode is off.
#[cfg(windows)]
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

fn classify(error: io::Error, original: &Path, link: &Path, kind: LinkKind) -> LinkError {
    #[cfg(windows)]
    if kind == LinkKind::Symbolic && error.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD) {
        return LinkError::InsufficientPrivilege {
            destination: link.to_path_buf(),
            error,
        };
    }

    if error.kind() == io::ErrorKind::Unsupported {
        return LinkError::UnsupportedLinkKind(kind);
    }

    LinkError::Failed {
        destination: link.to_path_buf(),
        source_path: original.to_path_buf(),
        kind,
        error,
    }
}

#[cfg(unix)]
fn create_symlink(original: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(original, link)
        .map_err(|e| classify(e, original, link, LinkKind::Symbolic))?;
    Ok(())
}

#[cfg(windows)]
fn create_symlink(original: &Path, link: &Path) -> Result<()> {
    use anyhow::{Context, bail};
    use std::os::windows::fs::{symlink_dir, symlink_file};

    // `is_dir()` on a relative path is relative to CWD; we want it relative to the link's parent.
    let target_path = if original.is_absolute() {
        original.to_path_buf()
    } else {
        link.parent()
            .context("Failed to get parent directory for symlink")?
            .join(original)
    };

    let created = if target_path.is_dir() {
        debug!("{} is a directory, creating directory symlink", target_path.display());
        symlink_dir(original, link)
    } else {
        symlink_file(original, link)
    };
    created.map_err(|e| classify(e, original, link, LinkKind::Symbolic))?;

    if fs::symlink_metadata(link).is_err() {
        bail!(
            "Symlink creation reported success but link does not exist: link={:?} target={:?}",
            link,
            original
        );
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_original: &Path, _link: &Path) -> Result<()> {
    Err(LinkError::UnsupportedLinkKind(LinkKind::Symbolic).into())
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        create_symlink(original, link)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn hard_link_impl(&self, original: &Path, link: &Path) -> Result<()> {
        // `CreateHardLinkW` on Windows, `link(2)` elsewhere; std reports
        // `Unsupported` on targets that have neither.
        fs::hard_link(original, link).map_err(|e| classify(e, original, link, LinkKind::Hard))?;
        debug!("Hard linked {} to {}", link.display(), original.display());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use tempfile::tempdir;

    #[cfg_attr(
        nulink_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set NULINK_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_real_runtime_file_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let target = dir.path().join("target.txt");
        runtime.write(&target, b"content").unwrap();

        let link = dir.path().join("link.txt");
        runtime.symlink(&target, &link).unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));
        assert_eq!(fs::read_link(&link).unwrap(), target);
        assert_eq!(runtime.read_to_string(&link).unwrap(), "content");
    }

    #[test]
    fn test_real_runtime_hard_link_shares_content() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let target = dir.path().join("payload.dll");
        runtime.write(&target, b"v1").unwrap();

        let link = dir.path().join("link.dll");
        runtime.hard_link(&target, &link).unwrap();
        assert!(!runtime.is_symlink(&link));

        // Writes through the original are visible through the hard link
        runtime.write(&target, b"v2").unwrap();
        assert_eq!(runtime.read_to_string(&link).unwrap(), "v2");
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_shares_inode() {
        use std::os::unix::fs::MetadataExt;

        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("payload.dll");
        runtime.write(&target, b"bytes").unwrap();
        let link = dir.path().join("link.dll");

        runtime.hard_link(&target, &link).unwrap();

        let a = fs::metadata(&target).unwrap();
        let b = fs::metadata(&link).unwrap();
        assert_eq!(a.ino(), b.ino());
        assert_eq!(a.dev(), b.dev());
    }

    #[test]
    fn test_hard_link_missing_source_is_link_failure() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let err = runtime
            .hard_link(&dir.path().join("missing.dll"), &dir.path().join("link.dll"))
            .unwrap_err();

        match err.downcast_ref::<LinkError>() {
            Some(LinkError::Failed { kind, error, .. }) => {
                assert_eq!(*kind, LinkKind::Hard);
                assert_eq!(error.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected LinkError::Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_over_existing_file_fails_with_os_error() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        let link = dir.path().join("link.txt");
        runtime.write(&target, b"a").unwrap();
        runtime.write(&link, b"b").unwrap();

        // The primitive does not replace; that's the Linker's job
        let err = runtime.symlink(&target, &link).unwrap_err();
        match err.downcast_ref::<LinkError>() {
            Some(LinkError::Failed { error, .. }) => {
                assert_eq!(error.kind(), io::ErrorKind::AlreadyExists);
                assert!(error.raw_os_error().is_some());
            }
            other => panic!("expected LinkError::Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unsupported() {
        let err = classify(
            io::Error::from(io::ErrorKind::Unsupported),
            Path::new("a"),
            Path::new("b"),
            LinkKind::Hard,
        );
        assert!(matches!(err, LinkError::UnsupportedLinkKind(LinkKind::Hard)));
    }

    #[cfg(windows)]
    #[test]
    fn test_classify_privilege_not_held() {
        let err = classify(
            io::Error::from_raw_os_error(ERROR_PRIVILEGE_NOT_HELD),
            Path::new("a"),
            Path::new("b"),
            LinkKind::Symbolic,
        );
        assert!(matches!(err, LinkError::InsufficientPrivilege { .. }));
    }
}
