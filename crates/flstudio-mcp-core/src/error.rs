//! Error types for the FL Studio MCP toolkit.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code used when the installer runs without administrator rights.
pub const EXIT_NOT_ELEVATED: i32 = 5;

/// Main error type for FL Studio MCP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Installer started without administrator/root privileges
    #[error("Administrator privileges are required. Re-run the installer as administrator.")]
    NotElevated,

    /// No FL Studio installation could be located
    #[error("FL Studio installation not found")]
    InstallDirNotFound,

    /// A bundled script directory is missing next to the installer
    #[error("Bundled script directory not found: {}", .0.display())]
    BundleNotFound(PathBuf),

    /// Filesystem operation failed on a specific path
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path the operation was acting on
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Bytes received on the bridge were not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A bridge message grew past the configured limit
    #[error("Message exceeds {0} bytes")]
    MessageTooLarge(usize),

    /// Command type not understood by the remote side
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Command parameters missing or malformed
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The remote script answered with an error status
    #[error("FL Studio error: {0}")]
    Remote(String),

    /// Timeout waiting for the remote side
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Peer closed the connection
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach a path to an IO error.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotElevated => EXIT_NOT_ELEVATED,
            _ => 1,
        }
    }

    /// Whether the error came from the transport rather than the remote script.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::ConnectionClosed | Error::Timeout(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
