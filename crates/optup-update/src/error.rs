//! Error types for the update engine

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using the engine's error type
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Failures of a single update step
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The release feed answered with something we cannot use
    #[error("Unexpected release feed response for '{code}': {reason}")]
    RemoteFeed { code: String, reason: String },

    /// No installation of the tool was found under the install root
    #[error("'{tool}' is not installed under {}", root.display())]
    NotInstalled { tool: String, root: PathBuf },

    /// Transport failure while talking to a remote endpoint
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Corrupt, truncated or empty archive
    #[error("Invalid archive {}: {reason}", path.display())]
    ArchiveFormat { path: PathBuf, reason: String },

    /// An archive entry would land outside the install root
    #[error("Archive entry '{entry}' escapes {}", root.display())]
    PathTraversal { entry: String, root: PathBuf },

    /// The command link path is occupied by something that is not a symlink
    #[error("Refusing to replace {}: not a symlink", path.display())]
    UnsafeLinkTarget { path: PathBuf },

    /// A version string could not be parsed
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A git-based tool could not be synced
    #[error("git failed in {}: {reason}", dir.display())]
    Git { dir: PathBuf, reason: String },

    /// Unexpected local filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    /// Create a release feed error
    pub fn remote_feed(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteFeed {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an archive format error
    pub fn archive_format(path: &Path, reason: impl fmt::Display) -> Self {
        Self::ArchiveFormat {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with a description of what was attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Step of a tool update, used to attribute failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Probing,
    Fetching,
    Extracting,
    Relinking,
    Syncing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Probing => "probing",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Relinking => "relinking",
            Stage::Syncing => "syncing",
        };
        f.write_str(name)
    }
}

/// A tool update that aborted, with the tool and stage it failed in
#[derive(Error, Debug)]
#[error("{tool}: {stage} failed: {source}")]
pub struct UpdateFailure {
    pub tool: String,
    pub stage: Stage,
    #[source]
    pub source: UpdateError,
}

impl UpdateFailure {
    pub fn new(tool: impl Into<String>, stage: Stage, source: UpdateError) -> Self {
        Self {
            tool: tool.into(),
            stage,
            source,
        }
    }
}
