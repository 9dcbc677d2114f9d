//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! the release feed endpoint, download chunking and the on-disk layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Directory layout overrides
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Platform key consulted in the release feed's download map
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            layout: LayoutConfig::default(),
            platform: default_platform(),
        }
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Release metadata endpoint
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// HTTP timeout in seconds; unset leaves the client default in place
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    /// Download chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub download_chunk_size: usize,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            http_timeout_secs: None,
            download_chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_feed_url() -> String {
    "https://data.services.jetbrains.com/products/releases".to_string()
}
fn default_chunk_size() -> usize {
    1024 * 1024 // 1 MiB
}
fn default_user_agent() -> String {
    format!(
        "optup/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Platform key for the host, as used by the release feed
pub fn default_platform() -> String {
    match std::env::consts::OS {
        "macos" => "mac",
        "windows" => "windows",
        _ => "linux",
    }
    .to_string()
}

/// Directory layout overrides. Unset entries fall back to home-relative defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Shared installation root (default `~/opt`)
    #[serde(default)]
    pub install_root: Option<PathBuf>,

    /// Directory holding the command symlinks (default `~/bin`)
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,

    /// Where archives are downloaded to (default `<cache>/optup/downloads`)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}
