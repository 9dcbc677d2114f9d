//! Command symlink management
//!
//! Each tool has one symlink `<bin-dir>/<name>` pointing at the launcher
//! script of its newest installation. The replacement symlink is created
//! under a temporary name and renamed over the old one, so the well-known
//! path always exists once it has been created. Anything at that path that
//! is not a symlink belongs to the user and is never touched.

use optup_core::types::ToolDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, UpdateError};

/// Repoints command symlinks at installation directories
pub struct LinkManager {
    bin_dir: PathBuf,
    install_root: PathBuf,
}

impl LinkManager {
    pub fn new(bin_dir: impl Into<PathBuf>, install_root: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            install_root: install_root.into(),
        }
    }

    /// Well-known symlink path for a tool
    pub fn link_path(&self, tool: &ToolDescriptor) -> PathBuf {
        self.bin_dir.join(&tool.name)
    }

    /// Symlink target for an installation directory
    ///
    /// Relative (`../opt/<dir>/bin/<name>.sh`) when the bin directory and the
    /// install root are siblings, absolute otherwise.
    pub fn link_target(&self, tool: &ToolDescriptor, install_dir: &str) -> PathBuf {
        let launcher = Path::new(install_dir).join("bin").join(tool.launcher_name());

        match (
            self.bin_dir.parent(),
            self.install_root.parent(),
            self.install_root.file_name(),
        ) {
            (Some(bin_parent), Some(root_parent), Some(root_name)) if bin_parent == root_parent => {
                Path::new("..").join(root_name).join(launcher)
            }
            _ => self.install_root.join(launcher),
        }
    }

    /// Current symlink target, if the link exists
    pub fn current_target(&self, tool: &ToolDescriptor) -> Option<PathBuf> {
        fs::read_link(self.link_path(tool)).ok()
    }

    /// Point the tool's symlink at `install_dir` (a directory name under the install root)
    ///
    /// Fails with [`UpdateError::UnsafeLinkTarget`], changing nothing, when the
    /// link path holds a regular file or directory.
    pub fn relink(&self, tool: &ToolDescriptor, install_dir: &str) -> Result<PathBuf> {
        let link = self.link_path(tool);
        let target = self.link_target(tool, install_dir);

        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                debug!("Replacing link \"{}\"", link.display());
            }
            Ok(_) => {
                return Err(UpdateError::UnsafeLinkTarget { path: link });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Creating link \"{}\"", link.display());
            }
            Err(e) => {
                return Err(UpdateError::io(
                    format!("Failed to inspect {}", link.display()),
                    e,
                ));
            }
        }

        let launcher = self.install_root.join(install_dir).join("bin").join(tool.launcher_name());
        if !launcher.is_file() {
            warn!("Launcher {} does not exist", launcher.display());
        }

        fs::create_dir_all(&self.bin_dir).map_err(|e| {
            UpdateError::io(format!("Failed to create {}", self.bin_dir.display()), e)
        })?;

        let staging = self.bin_dir.join(format!(".{}.optup-new", tool.name));
        remove_stale(&staging)?;

        symlink(&target, &staging).map_err(|e| {
            UpdateError::io(format!("Failed to create link {}", staging.display()), e)
        })?;

        if let Err(e) = fs::rename(&staging, &link) {
            let _ = fs::remove_file(&staging);
            return Err(UpdateError::io(
                format!("Failed to move link into place at {}", link.display()),
                e,
            ));
        }

        info!("Linked {} -> {}", link.display(), target.display());
        Ok(link)
    }
}

/// Remove a leftover staging link from an interrupted run
fn remove_stale(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path)
            .map_err(|e| UpdateError::io(format!("Failed to remove {}", path.display()), e)),
        Ok(_) => Err(UpdateError::UnsafeLinkTarget {
            path: path.to_path_buf(),
        }),
        Err(_) => Ok(()),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
