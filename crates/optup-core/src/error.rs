//! Error types for optup-core

use thiserror::Error;

/// Result type alias using optup-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for optup
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tool name not present in the registry
    #[error("Unknown tool: {name}. Known tools: {known}")]
    UnknownTool { name: String, known: String },

    /// Neither $HOME nor the platform home directory could be determined
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown tool error listing the registered names
    pub fn unknown_tool<'a>(
        name: impl Into<String>,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownTool {
            name: name.into(),
            known: known.into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}
