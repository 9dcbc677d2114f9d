//! Gzip'd tar extraction confined to an installation root
//!
//! Extraction runs in two passes over the archive. The first pass decodes
//! every header and checks that each entry, and the target of each link
//! entry, resolves underneath the install root. Entry paths are held to the
//! same rules `unpack_in` applies later: no `..` components and no path
//! through a symlink laid down by an earlier entry. Only when every entry passes
//! does the second pass write anything. A single escaping entry fails the
//! whole operation with nothing extracted.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

/// Extracts release archives into the shared installation root
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeExtractor;

impl SafeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract `archive_path` into `install_root`
    ///
    /// Returns the name of the archive's first top-level directory, which is
    /// the new installation directory.
    pub fn extract(&self, archive_path: &Path, install_root: &Path) -> Result<String> {
        let top_level = self.validate(archive_path, install_root)?;

        info!(
            "Extracting {} to {}",
            archive_path.display(),
            install_root.display()
        );

        fs::create_dir_all(install_root).map_err(|e| {
            UpdateError::io(format!("Failed to create {}", install_root.display()), e)
        })?;

        let mut archive = open_archive(archive_path)?;
        archive.set_preserve_permissions(true);
        archive.set_overwrite(true);

        let entries = archive
            .entries()
            .map_err(|e| UpdateError::archive_format(archive_path, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| UpdateError::archive_format(archive_path, e))?;
            let entry_path = entry
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();

            let unpacked = entry.unpack_in(install_root).map_err(|e| {
                UpdateError::io(format!("Failed to extract '{}'", entry_path), e)
            })?;

            if !unpacked {
                return Err(UpdateError::PathTraversal {
                    entry: entry_path,
                    root: install_root.to_path_buf(),
                });
            }
        }

        debug!("tar dir: \"{}\"", top_level);
        Ok(top_level)
    }

    /// Check every entry without writing anything; returns the top-level directory name
    ///
    /// Entry paths may not be absolute, may not contain `..` and may not run
    /// through a symlink written by an earlier entry. Link targets must
    /// resolve inside the root without passing through such a symlink.
    pub fn validate(&self, archive_path: &Path, install_root: &Path) -> Result<String> {
        let mut archive = open_archive(archive_path)?;
        let entries = archive
            .entries()
            .map_err(|e| UpdateError::archive_format(archive_path, e))?;

        let mut top_level: Option<String> = None;
        let mut symlinks: Vec<PathBuf> = Vec::new();
        let mut count = 0usize;

        for entry in entries {
            let entry = entry.map_err(|e| UpdateError::archive_format(archive_path, e))?;
            count += 1;

            let raw = entry
                .path()
                .map_err(|e| UpdateError::archive_format(archive_path, e))?
                .into_owned();
            let traversal = || UpdateError::PathTraversal {
                entry: raw.display().to_string(),
                root: install_root.to_path_buf(),
            };

            let relative = member_path(&raw).ok_or_else(traversal)?;
            if through_symlink(&relative, &symlinks) {
                debug!("'{}' runs through an archive symlink", raw.display());
                return Err(traversal());
            }

            check_link(&entry, &raw, &relative, &symlinks, archive_path, install_root)?;

            if entry.header().entry_type() == EntryType::Symlink {
                symlinks.push(relative.clone());
            }

            if top_level.is_none() {
                top_level = first_component(&relative);
            }
        }

        if count == 0 {
            return Err(UpdateError::archive_format(archive_path, "archive has no entries"));
        }

        top_level.ok_or_else(|| {
            UpdateError::archive_format(archive_path, "archive has no top-level directory")
        })
    }
}

fn open_archive(archive_path: &Path) -> Result<Archive<GzDecoder<BufReader<File>>>> {
    let file = File::open(archive_path).map_err(|e| {
        UpdateError::io(format!("Failed to open {}", archive_path.display()), e)
    })?;
    Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
}

/// Reject link entries whose target resolves outside the root
fn check_link<R: Read>(
    entry: &tar::Entry<'_, R>,
    raw: &Path,
    relative: &Path,
    symlinks: &[PathBuf],
    archive_path: &Path,
    install_root: &Path,
) -> Result<()> {
    let entry_type = entry.header().entry_type();
    if !matches!(entry_type, EntryType::Symlink | EntryType::Link) {
        return Ok(());
    }

    let target = entry
        .link_name()
        .map_err(|e| UpdateError::archive_format(archive_path, e))?
        .ok_or_else(|| {
            UpdateError::archive_format(
                archive_path,
                format!("link entry '{}' has no target", raw.display()),
            )
        })?;

    // Hard link targets name another archive member; symlinks resolve from their own directory.
    let resolved = if entry_type == EntryType::Link {
        member_path(&target)
    } else if target.is_absolute() {
        None
    } else {
        contained(
            &relative
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&target),
        )
    };

    match resolved {
        Some(path) if !through_symlink(&path, symlinks) => Ok(()),
        _ => Err(UpdateError::PathTraversal {
            entry: format!("{} -> {}", raw.display(), target.display()),
            root: install_root.to_path_buf(),
        }),
    }
}

/// Normalized path of an archive member; `None` if absolute or containing `..`
fn member_path(path: &Path) -> Option<PathBuf> {
    if path.components().any(|c| c == Component::ParentDir) {
        return None;
    }
    contained(path)
}

/// Whether `path` is, or lies beneath, one of the recorded symlinks
fn through_symlink(path: &Path, symlinks: &[PathBuf]) -> bool {
    symlinks.iter().any(|link| path.starts_with(link))
}

/// Lexically normalize an archive path relative to the root
///
/// Returns `None` for absolute paths and for paths whose `..` components
/// climb above the root at any point.
pub fn contained(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    Some(normalized)
}

fn first_component(path: &Path) -> Option<String> {
    path.components().find_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    })
}
