//! Error conditions callers need to tell apart.
//!
//! Everything else travels as a plain `anyhow::Error` with context. These
//! types are carried inside `anyhow::Error` as well and recovered with
//! `downcast_ref` where the distinction matters.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::linker::LinkKind;

/// Bad command-line input. Reported as a message only, without a backtrace.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UserInputError(pub String);

impl UserInputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{} doesn't exist", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Package type {0} is not supported")]
    UnsupportedPackageType(String),

    #[error("Package {0} is a tool but ships no DotnetToolSettings.xml")]
    ToolSettingsNotFound(String),

    #[error("Target path {0:?} escapes the package directory")]
    InvalidTargetPath(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Insufficient privilege to create a symbolic link at {}", destination.display())]
    InsufficientPrivilege {
        destination: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("{0} links are not supported on this platform")]
    UnsupportedLinkKind(LinkKind),

    #[error(
        "Failed to create {kind} link {} -> {}",
        destination.display(),
        source_path.display()
    )]
    Failed {
        destination: PathBuf,
        source_path: PathBuf,
        kind: LinkKind,
        #[source]
        error: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool entry point {0} is not among the package files")]
    EntryPointNotFound(String),
}
