//! Runtime abstraction for system operations.
//!
//! Every filesystem, environment and link primitive the linking engine needs
//! goes through the [`Runtime`] trait so the engine can be exercised against
//! `MockRuntime` in tests and against the real system in production.
//!
//! # Structure
//!
//! - `path` - Path utility functions (normalize, display, containment)
//! - `env` - Environment variables, home directory, privilege
//! - `fs` - File system operations (read, write, directory, metadata)
//! - `link` - Platform link primitives (symbolic and hard links)

mod env;
mod fs;
mod link;
pub mod path;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use path::{display_path, is_path_under, normalize_path};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn current_dir(&self) -> Result<PathBuf>;
    fn home_dir(&self) -> Option<PathBuf>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    /// Paths matching a glob pattern, in the order the filesystem yields them.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Set file permissions (mode) on Unix systems. No-op on Windows.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;

    // Links
    /// Create a symbolic link at `link` pointing to `original`.
    ///
    /// Privilege failures surface as [`crate::error::LinkError::InsufficientPrivilege`].
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;

    /// Create a hard link at `link` sharing the inode of `original`.
    fn hard_link(&self, original: &Path, link: &Path) -> Result<()>;

    /// True for live and dangling symlinks alike.
    fn is_symlink(&self, path: &Path) -> bool;

    // Privilege
    fn is_privileged(&self) -> bool;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.modified_impl(path)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.set_permissions_impl(path, mode)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> Result<()> {
        self.hard_link_impl(original, link)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }
}
