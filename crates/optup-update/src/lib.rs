//! Update engine for optup
//!
//! Provides:
//! - Version probing (installed copies and the remote release feed)
//! - Release-version ordering
//! - Streaming archive download with progress telemetry
//! - Archive extraction that refuses entries escaping the install root
//! - Command symlink replacement that never clobbers a regular file
//! - The per-tool orchestration tying these together, plus git-based tools

pub mod download;
pub mod error;
pub mod extract;
pub mod git;
pub mod link;
pub mod probe;
pub mod releases;
pub mod updater;
pub mod version;

pub use download::{
    ArchiveFetcher, DownloadProgress, NoProgress, ProgressBarSink, ProgressSink, TracingProgress,
};
pub use error::{Stage, UpdateError, UpdateFailure};
pub use extract::SafeExtractor;
pub use link::LinkManager;
pub use probe::{InstalledVersion, VersionProbe};
pub use releases::{DownloadDescriptor, ReleaseClient, ReleaseInfo};
pub use updater::{CheckReport, UpdateOutcome, UpdateReport, UpdateState, Updater};
pub use version::VersionId;
