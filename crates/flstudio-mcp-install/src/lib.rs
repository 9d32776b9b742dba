//! # flstudio-mcp-install
//!
//! Copies the bundled FL Studio remote scripts into an FL Studio installation.
//!
//! The flow is strictly sequential:
//!
//! 1. refuse to run without administrator/root privileges
//! 2. find the FL Studio directory (fixed candidates, then ask the operator)
//! 3. create the destination directory if needed
//! 4. delete any previous copy of each script
//! 5. copy the bundled script directories recursively
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on flstudio-mcp-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod copy;
pub mod installer;
pub mod locate;
pub mod privilege;

// Re-export commonly used types
pub use bundle::{resolve_bundle_root, script_source, BUNDLE_ROOT_ENV};
pub use copy::{copy_tree, remove_tree, tree_listing, CopyStats};
pub use installer::{
    install, uninstall, InstallOptions, InstallReport, ScriptReport, UninstallReport,
};
pub use locate::{locate_install_dir, Location, LocationSource, PathPrompt, TerminalPrompt};
pub use privilege::{PrivilegeCheck, SystemPrivilegeCheck};
