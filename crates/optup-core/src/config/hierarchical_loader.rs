//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.optup/config.yaml, ~/.optup/tools.yaml)
//! 3. Environment variables (OPTUP_* prefix)
//! 4. CLI flags (handled by caller)
//!
//! Loading never writes to disk.

use crate::error::{Error, Result};
use crate::types::{LayoutConfig, RuntimeConfig, ToolRegistry};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader for the standard config directory (~/.optup)
    pub fn new() -> Result<Self> {
        let home = crate::types::get_home_dir()?;
        Ok(Self {
            config_dir: home.join(".optup"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let runtime_config_path = self.config_dir.join("config.yaml");
        if runtime_config_path.exists() {
            debug!("Loading runtime config from {}", runtime_config_path.display());
            let file_config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        self.apply_env_overrides(config)
    }

    /// Load the tool registry: embedded tools overlaid by the user's tools.yaml
    pub fn load_tool_registry(&self) -> Result<ToolRegistry> {
        let mut registry = Self::load_embedded_config::<ToolRegistry>("tools.yaml")?;

        let tools_path = self.config_dir.join("tools.yaml");
        if tools_path.exists() {
            debug!("Loading tool registry overlay from {}", tools_path.display());
            let overlay = self.load_yaml_file::<ToolRegistry>(&tools_path)?;
            registry = registry.merge(overlay);
        }

        registry.validate()?;
        Ok(registry)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            layout: LayoutConfig {
                install_root: overlay.layout.install_root.or(base.layout.install_root),
                bin_dir: overlay.layout.bin_dir.or(base.layout.bin_dir),
                download_dir: overlay.layout.download_dir.or(base.layout.download_dir),
            },
            platform: overlay.platform,
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("OPTUP_FEED_URL") {
            config.network.feed_url = val;
        }

        if let Ok(val) = env::var("OPTUP_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = Some(val.parse().map_err(|_| {
                Error::invalid_config("OPTUP_HTTP_TIMEOUT_SECS must be a valid number")
            })?);
        }

        if let Ok(val) = env::var("OPTUP_DOWNLOAD_CHUNK_SIZE") {
            let chunk_size: usize = val.parse().map_err(|_| {
                Error::invalid_config("OPTUP_DOWNLOAD_CHUNK_SIZE must be a valid number")
            })?;
            config.network.download_chunk_size = chunk_size;
        }

        if config.network.download_chunk_size == 0 {
            return Err(Error::invalid_config(
                "download-chunk-size must be greater than zero",
            ));
        }

        if let Ok(val) = env::var("OPTUP_INSTALL_ROOT") {
            config.layout.install_root = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("OPTUP_BIN_DIR") {
            config.layout.bin_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("OPTUP_DOWNLOAD_DIR") {
            config.layout.download_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = env::var("OPTUP_PLATFORM") {
            config.platform = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
