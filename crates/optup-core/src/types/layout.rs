//! Filesystem layout shared by every managed tool

use std::path::{Path, PathBuf};

use super::runtime_config::LayoutConfig;
use crate::error::{Error, Result};

/// Resolved directories for one process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shared installation root; one subdirectory per installed version
    pub install_root: PathBuf,

    /// Location of the well-known command symlinks
    pub bin_dir: PathBuf,

    /// Download destination for fetched archives
    pub download_dir: PathBuf,
}

impl Layout {
    /// Build a layout rooted at `home` (`<home>/opt`, `<home>/bin`)
    pub fn under_home(home: &Path) -> Self {
        Self {
            install_root: home.join("opt"),
            bin_dir: home.join("bin"),
            download_dir: home.join(".cache").join("optup").join("downloads"),
        }
    }

    /// Resolve the layout from configuration, filling gaps from the home directory
    pub fn resolve(config: &LayoutConfig) -> Result<Self> {
        let home = get_home_dir()?;
        let mut layout = Self::under_home(&home);

        if let Some(cache) = dirs::cache_dir() {
            layout.download_dir = cache.join("optup").join("downloads");
        }
        if let Some(root) = &config.install_root {
            layout.install_root = root.clone();
        }
        if let Some(bin) = &config.bin_dir {
            layout.bin_dir = bin.clone();
        }
        if let Some(downloads) = &config.download_dir {
            layout.download_dir = downloads.clone();
        }

        Ok(layout)
    }
}

/// Get the user's home directory
///
/// `$HOME` wins over the platform lookup so that tests and containers can
/// redirect it.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir().ok_or(Error::HomeDirUnavailable)
}
