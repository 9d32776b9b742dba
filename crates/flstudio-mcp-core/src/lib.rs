//! # flstudio-mcp-core
//!
//! Core types for the FL Studio MCP toolkit.
//!
//! This crate contains the fundamental types with **no internal dependencies**
//! on other flstudio-mcp crates. It provides:
//!
//! - The JSON wire protocol spoken with the FL Studio remote script
//! - YAML configuration for the bridge, installer and logging
//! - Install layout (FL Studio directories, bundled script names)
//! - Platform detection
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other flstudio-mcp crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod paths;
pub mod platform;
pub mod protocol;

// Re-export commonly used types
pub use config::{BridgeSettings, InstallSettings, LoggingSettings, ServerConfig};
pub use error::{Error, Result};
pub use paths::{BundledScript, InstallLayout};
pub use platform::Platform;
pub use protocol::{Command, CommandType, Note, Response, ResponseStatus};
