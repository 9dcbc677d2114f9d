//! Temporary home directories with installed tools

use optup_core::types::{Layout, RuntimeConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Platform key used by every test feed
pub const TEST_PLATFORM: &str = "linux";

/// A throwaway home directory laid out like a real one
pub struct TestHome {
    _temp: TempDir,
    pub home: PathBuf,
    pub layout: Layout,
}

impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_path_buf();
        let mut layout = Layout::under_home(&home);
        layout.download_dir = home.join("downloads");
        Self {
            _temp: temp,
            home,
            layout,
        }
    }

    /// Create `<install_root>/<dir>` with a launcher and a `build.txt` marker
    pub fn install(&self, dir: &str, tool: &str, marker: &str) -> PathBuf {
        let install_dir = self.layout.install_root.join(dir);
        fs::create_dir_all(install_dir.join("bin")).unwrap();
        fs::write(
            install_dir.join("bin").join(format!("{}.sh", tool)),
            "#!/bin/sh\n",
        )
        .unwrap();
        fs::write(install_dir.join("build.txt"), format!("{}\n", marker)).unwrap();
        install_dir
    }

    /// Point `<bin_dir>/<tool>` at the launcher in `<install_root>/<dir>`
    #[cfg(unix)]
    pub fn link(&self, tool: &str, dir: &str) -> PathBuf {
        fs::create_dir_all(&self.layout.bin_dir).unwrap();
        let link = self.layout.bin_dir.join(tool);
        let target = Path::new("..")
            .join("opt")
            .join(dir)
            .join("bin")
            .join(format!("{}.sh", tool));
        std::os::unix::fs::symlink(target, &link).unwrap();
        link
    }

    pub fn link_path(&self, tool: &str) -> PathBuf {
        self.layout.bin_dir.join(tool)
    }

    /// Runtime configuration talking to `server_uri`
    pub fn config(&self, server_uri: &str) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.network.feed_url = format!("{}{}", server_uri, FEED_PATH);
        config.network.download_chunk_size = 4096;
        config.platform = TEST_PLATFORM.to_string();
        config
    }

    /// Every file and symlink under the home directory with its content or target
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        let mut entries = BTreeMap::new();
        walk(&self.home, &self.home, &mut entries);
        entries
    }
}

/// Path of the release feed on the mock server
pub const FEED_PATH: &str = "/products/releases";

fn walk(root: &Path, dir: &Path, entries: &mut BTreeMap<PathBuf, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let relative = path.strip_prefix(root).unwrap().to_path_buf();
        let meta = fs::symlink_metadata(&path).unwrap();
        if meta.file_type().is_symlink() {
            let target = fs::read_link(&path).unwrap();
            entries.insert(relative, format!("-> {}", target.display()));
        } else if meta.is_dir() {
            entries.insert(relative, "<dir>".to_string());
            walk(root, &path, entries);
        } else {
            let content = fs::read(&path).unwrap();
            entries.insert(relative, String::from_utf8_lossy(&content).into_owned());
        }
    }
}

/// Files (not directories) under `dir`, relative to it, with their contents
pub fn files_under(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut entries = BTreeMap::new();
    collect_files(dir, dir, &mut entries);
    entries
}

fn collect_files(root: &Path, dir: &Path, entries: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let meta = fs::symlink_metadata(&path).unwrap();
        if meta.is_dir() {
            collect_files(root, &path, entries);
        } else if meta.is_file() {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            entries.insert(relative, fs::read(&path).unwrap());
        }
    }
}
