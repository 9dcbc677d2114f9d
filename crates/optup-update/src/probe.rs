//! Version discovery for installed copies and the remote feed

use optup_core::types::{ReleaseSource, ToolDescriptor};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, UpdateError};
use crate::releases::{ReleaseClient, ReleaseInfo};
use crate::version::VersionId;

/// Version marker file inside every installation directory
pub const MARKER_FILE: &str = "build.txt";

/// One installation found under the install root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: VersionId,
    pub dir: PathBuf,
}

/// Determines installed and available versions of a tool
pub struct VersionProbe {
    install_root: PathBuf,
    releases: ReleaseClient,
}

impl VersionProbe {
    pub fn new(install_root: impl Into<PathBuf>, releases: ReleaseClient) -> Self {
        Self {
            install_root: install_root.into(),
            releases,
        }
    }

    /// Latest release advertised by the feed
    pub async fn latest_remote(&self, source: &ReleaseSource) -> Result<ReleaseInfo> {
        self.releases.latest_release(source).await
    }

    /// Highest installed version of `tool`
    pub fn installed(&self, tool: &ToolDescriptor) -> Result<InstalledVersion> {
        installed_version(&self.install_root, tool)
    }
}

/// Highest installed version of `tool` under `install_root`
pub fn installed_version(install_root: &Path, tool: &ToolDescriptor) -> Result<InstalledVersion> {
    installed_versions(install_root, tool)?
        .pop()
        .ok_or_else(|| UpdateError::NotInstalled {
            tool: tool.name.clone(),
            root: install_root.to_path_buf(),
        })
}

/// Every installation of `tool` under `install_root`, lowest version first
///
/// A directory counts as an installation of the tool when it contains
/// `bin/<name>.sh`. Each match must carry a readable version marker.
pub fn installed_versions(
    install_root: &Path,
    tool: &ToolDescriptor,
) -> Result<Vec<InstalledVersion>> {
    let entries = match fs::read_dir(install_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(UpdateError::io(
                format!("Failed to read {}", install_root.display()),
                e,
            ))
        }
    };

    let launcher = tool.launcher_name();
    let mut versions = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| {
            UpdateError::io(format!("Failed to read {}", install_root.display()), e)
        })?;
        let dir = entry.path();

        if !dir.is_dir() || !dir.join("bin").join(&launcher).is_file() {
            continue;
        }

        let version = read_marker(&dir.join(MARKER_FILE))?;
        debug!("Found {} {} in {}", tool.name, version, dir.display());
        versions.push(InstalledVersion { version, dir });
    }

    versions.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(versions)
}

/// Parse the version out of a marker file whose first line is `<prefix>-<version>`
pub fn read_marker(path: &Path) -> Result<VersionId> {
    let file = fs::File::open(path)
        .map_err(|e| UpdateError::io(format!("Failed to open {}", path.display()), e))?;

    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| UpdateError::io(format!("Failed to read {}", path.display()), e))?;

    parse_marker_line(first_line.trim_end())
}

/// `CL-241.15989.155` -> `241.15989.155`; the version follows the first hyphen
pub fn parse_marker_line(line: &str) -> Result<VersionId> {
    let (_, version) = line.split_once('-').ok_or_else(|| {
        UpdateError::invalid_version(line, "marker line has no '<prefix>-' part")
    })?;
    VersionId::parse(version)
}
