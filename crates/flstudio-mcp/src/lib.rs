//! FL Studio MCP Library
//!
//! This library contains the command-line definition, logging setup and the
//! MCP protocol layer. The binary entry point is in main.rs.

pub mod cli;
pub mod logging;
pub mod protocol;
pub mod tools;

// Re-export commonly used types
pub use cli::{Cli, Commands};
pub use protocol::FlStudioMcpServer;
pub use tools::*;
