//! Type definitions for optup configuration and the tool registry

mod layout;
mod runtime_config;
mod tool_types;

pub use layout::*;
pub use runtime_config::*;
pub use tool_types::*;
