//! Common test infrastructure for optup-update tests
//!
//! # Modules
//!
//! - `archives`: Builder for gzip'd tar archives, including malicious entries
//! - `feed`: Release feed payloads
//! - `fixtures`: Temporary home directories with installed tools
//! - `mock_server`: Wiremock setup for the feed and archive endpoints
//! - `progress`: A progress sink that records what it was told

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod archives;
pub mod feed;
pub mod fixtures;
pub mod mock_server;
pub mod progress;

pub use archives::*;
pub use feed::*;
pub use fixtures::*;
pub use mock_server::*;
pub use progress::*;
