//! Builder for gzip'd tar archives
//!
//! Paths added with [`ArchiveBuilder::raw_file`] bypass the tar crate's own
//! path validation so tests can produce archives that try to escape.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io;
use std::path::Path;
use tar::{EntryType, Header};

#[derive(Debug, Clone)]
enum Entry {
    Dir(String),
    File { path: String, content: Vec<u8>, mode: u32 },
    Symlink { path: String, target: String },
    Raw { path: String, content: Vec<u8> },
}

/// Fluent builder for `.tar.gz` test archives
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A typical installation: `<top>/`, launcher script and version marker
    pub fn installation(top: &str, tool: &str, marker: &str) -> Self {
        Self::new()
            .dir(top)
            .dir(&format!("{}/bin", top))
            .executable(
                &format!("{}/bin/{}.sh", top, tool),
                b"#!/bin/sh\nexec java -jar ../lib/app.jar \"$@\"\n",
            )
            .file(&format!("{}/build.txt", top), marker.as_bytes())
            .dir(&format!("{}/lib", top))
            .file(&format!("{}/lib/app.jar", top), b"PK\x03\x04 not really a jar")
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(Entry::Dir(path.to_string()));
        self
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.entries.push(Entry::File {
            path: path.to_string(),
            content: content.to_vec(),
            mode: 0o644,
        });
        self
    }

    pub fn executable(mut self, path: &str, content: &[u8]) -> Self {
        self.entries.push(Entry::File {
            path: path.to_string(),
            content: content.to_vec(),
            mode: 0o755,
        });
        self
    }

    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.entries.push(Entry::Symlink {
            path: path.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Regular file whose name is written verbatim into the header
    pub fn raw_file(mut self, path: &str, content: &[u8]) -> Self {
        self.entries.push(Entry::Raw {
            path: path.to_string(),
            content: content.to_vec(),
        });
        self
    }

    /// Encode the archive
    pub fn build(&self) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for entry in &self.entries {
            let mut header = Header::new_gnu();
            match entry {
                Entry::Dir(path) => {
                    header.set_entry_type(EntryType::Directory);
                    header.set_path(path).unwrap();
                    header.set_mode(0o755);
                    header.set_size(0);
                    header.set_cksum();
                    builder.append(&header, io::empty()).unwrap();
                }
                Entry::File {
                    path,
                    content,
                    mode,
                } => {
                    header.set_entry_type(EntryType::Regular);
                    header.set_path(path).unwrap();
                    header.set_mode(*mode);
                    header.set_size(content.len() as u64);
                    header.set_cksum();
                    builder.append(&header, content.as_slice()).unwrap();
                }
                Entry::Symlink { path, target } => {
                    header.set_entry_type(EntryType::Symlink);
                    header.set_path(path).unwrap();
                    header.set_link_name(target).unwrap();
                    header.set_mode(0o777);
                    header.set_size(0);
                    header.set_cksum();
                    builder.append(&header, io::empty()).unwrap();
                }
                Entry::Raw { path, content } => {
                    let bytes = path.as_bytes();
                    header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
                    header.set_entry_type(EntryType::Regular);
                    header.set_mode(0o644);
                    header.set_size(content.len() as u64);
                    header.set_cksum();
                    builder.append(&header, content.as_slice()).unwrap();
                }
            }
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Encode the archive and write it to `path`
    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// Deterministic, poorly compressible bytes
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}
