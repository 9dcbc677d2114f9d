//! # optup-core
//!
//! Core library for the optup CLI providing:
//! - Runtime configuration with hierarchical precedence
//! - The tool registry (one descriptor per managed tool)
//! - Resolution of the install/bin/download directory layout

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{Layout, RuntimeConfig, ToolDescriptor, ToolKind, ToolRegistry};
