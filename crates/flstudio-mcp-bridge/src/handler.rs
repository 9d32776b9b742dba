//! The seam between the bridge server and whatever executes commands.

use serde_json::Value;

use flstudio_mcp_core::{Command, Response, Result};

/// Executes bridge commands.
///
/// Handlers are synchronous; the server runs them on the blocking pool.
pub trait CommandHandler: Send + Sync + 'static {
    /// Execute one command and return its `result` payload.
    ///
    /// Unknown command names should fail with
    /// [`flstudio_mcp_core::Error::UnknownCommand`].
    fn handle(&self, command: &Command) -> Result<Value>;
}

/// Run a command and wrap the outcome in a wire [`Response`].
pub fn dispatch(handler: &dyn CommandHandler, command: &Command) -> Response {
    match handler.handle(command) {
        Ok(result) => Response::success(result),
        Err(err) => Response::from(err),
    }
}
