//! # flstudio-mcp-bridge
//!
//! The command channel between client programs and the FL Studio remote
//! script.
//!
//! This crate provides:
//! - Framing for undelimited JSON messages on a byte stream
//! - A TCP bridge server dispatching commands to a [`CommandHandler`]
//! - [`SimulatedStudio`], an in-process stand-in for FL Studio
//! - [`FlStudioClient`], a reconnecting client with a simulation fallback
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on
//! flstudio-mcp-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod framing;
pub mod handler;
pub mod server;
pub mod simulate;
pub mod studio;

// Re-export commonly used types
pub use client::{ConnectionStatus, FlStudioClient, SimulationFlag};
pub use framing::JsonStreamDecoder;
pub use handler::{dispatch, CommandHandler};
pub use server::{BridgeServer, ShutdownHandle};
pub use simulate::simulated_response;
pub use studio::{PluginKind, SimulatedStudio};
