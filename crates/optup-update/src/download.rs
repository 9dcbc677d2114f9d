//! Archive download with progress telemetry
//!
//! Archives are streamed from the network and written to disk in fixed-size
//! chunks. After every chunk the fraction written so far is reported to a
//! [`ProgressSink`]. Progress is observational only: sinks cannot slow down
//! or abort a download.
//!
//! Downloads are neither resumed nor retried. A failed transfer leaves the
//! partial file behind; the next run truncates and rewrites the same path.

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, UpdateError};

/// Default chunk size for writing downloads (1 MiB)
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Download progress information
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Total bytes to download, as declared by the release feed
    pub total_bytes: u64,

    /// Bytes written so far
    pub downloaded_bytes: u64,

    /// Progress percentage (0-100)
    pub percentage: f64,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            percentage: 0.0,
        }
    }

    /// Update progress with new downloaded bytes
    pub fn update(&mut self, downloaded_bytes: u64) {
        self.downloaded_bytes = downloaded_bytes;
        self.percentage = if self.total_bytes > 0 {
            (self.downloaded_bytes as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        };
    }

    /// `downloaded / total`, or 0 when the total is unknown
    pub fn fraction(&self) -> f64 {
        self.percentage / 100.0
    }
}

/// Receiver of download progress
pub trait ProgressSink: Send + Sync {
    /// Called once before the first chunk
    fn start(&self, _label: &str, _total_bytes: u64) {}

    /// Called after every chunk written
    fn advance(&self, progress: &DownloadProgress);

    /// Called once after the last chunk
    fn finish(&self, _progress: &DownloadProgress) {}
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&self, _progress: &DownloadProgress) {}
}

/// Logs progress percentages at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn advance(&self, progress: &DownloadProgress) {
        debug!("finished {:.2}%", progress.percentage);
    }
}

/// Renders progress as an indicatif bar
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressBarSink {
    fn start(&self, label: &str, total_bytes: u64) {
        self.bar.set_length(total_bytes);
        self.bar.set_position(0);
        self.bar.set_message(format!("Downloading {}", label));
    }

    fn advance(&self, progress: &DownloadProgress) {
        self.bar.set_position(progress.downloaded_bytes);
    }

    fn finish(&self, _progress: &DownloadProgress) {
        self.bar.finish_and_clear();
    }
}

/// Streams remote archives to local files
pub struct ArchiveFetcher {
    client: reqwest::Client,
    chunk_size: usize,
}

impl ArchiveFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            chunk_size: DOWNLOAD_CHUNK_SIZE,
        }
    }

    /// Set the write chunk size (zero is treated as one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Download `url` to `destination`, returning the number of bytes written
    ///
    /// `declared_size` is the size advertised by the release feed. It drives
    /// the progress fraction; a mismatch with the bytes received is logged
    /// but not treated as a failure.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        declared_size: u64,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        info!(
            "Downloading {} ({}) to {}",
            url,
            human_readable_size(declared_size),
            destination.display()
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::fetch(
                url,
                format!("HTTP status {}", response.status()),
            ));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                UpdateError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        let mut file = File::create(destination).map_err(|e| {
            UpdateError::io(format!("Failed to create {}", destination.display()), e)
        })?;

        let label = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        progress.start(&label, declared_size);

        let mut state = DownloadProgress::new(declared_size);
        let mut pending: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk: bytes::Bytes = chunk_result.map_err(|e| UpdateError::fetch(url, e))?;
            pending.extend_from_slice(&chunk);

            while pending.len() >= self.chunk_size {
                let rest = pending.split_off(self.chunk_size);
                written += self.write_chunk(&mut file, &pending, destination)?;
                pending = rest;
                state.update(written);
                progress.advance(&state);
            }
        }

        if !pending.is_empty() {
            written += self.write_chunk(&mut file, &pending, destination)?;
            state.update(written);
            progress.advance(&state);
        }

        file.flush()
            .map_err(|e| UpdateError::io(format!("Failed to flush {}", destination.display()), e))?;
        progress.finish(&state);

        if declared_size != written {
            warn!(
                "Downloaded {} bytes from {}, feed declared {}",
                written, url, declared_size
            );
        }

        Ok(written)
    }

    fn write_chunk(&self, file: &mut File, chunk: &[u8], destination: &Path) -> Result<u64> {
        file.write_all(chunk).map_err(|e| {
            UpdateError::io(format!("Failed to write {}", destination.display()), e)
        })?;
        Ok(chunk.len() as u64)
    }
}

/// Convert bytes to human-readable size
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
