//! Filesystem layout of an FL Studio installation and of the bundled scripts.
//!
//! Paths are treated as opaque; nothing here touches the filesystem except
//! [`userprofile_dir`], which only reads the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Platform};

/// Package directory created under FL Studio's bundled Python `site-packages`.
pub const PACKAGE_DIR: &str = "flmcp";

/// Scripts shipped next to the installer and copied into FL Studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundledScript {
    /// The MCP remote script listening for JSON commands
    RemoteScript,
    /// Minimal script toggling playback, used to verify script loading
    PlayPauseTest,
}

impl BundledScript {
    /// Every bundled script, in install order.
    pub fn all() -> [BundledScript; 2] {
        [BundledScript::RemoteScript, BundledScript::PlayPauseTest]
    }

    /// Directory name, both next to the installer and at the destination.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BundledScript::RemoteScript => "FlStudioMCP_Remote_Script",
            BundledScript::PlayPauseTest => "FL_PlayPause_Test",
        }
    }

    /// Log file the script writes once FL Studio loads it.
    pub fn log_path(&self, userprofile: &Path) -> PathBuf {
        match self {
            BundledScript::RemoteScript => userprofile
                .join("Documents")
                .join("FL Studio")
                .join("Logs")
                .join("flstudio_mcp.log"),
            BundledScript::PlayPauseTest => userprofile.join("fl_playpause_test.log"),
        }
    }
}

impl std::fmt::Display for BundledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for BundledScript {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "remote" | "remote_script" | "flstudiomcp_remote_script" => {
                Ok(BundledScript::RemoteScript)
            }
            "playpause" | "play_pause_test" | "fl_playpause_test" => {
                Ok(BundledScript::PlayPauseTest)
            }
            other => Err(Error::Config(format!("unknown bundled script '{other}'"))),
        }
    }
}

/// Where the scripts end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallLayout {
    /// `<FL Studio>/Shared/Python/Lib/site-packages/flmcp/<script>`
    #[default]
    SitePackages,
    /// `<USERPROFILE>/Documents/Image-Line/FL Studio/Settings/Hardware/<script>`
    Hardware,
}

impl InstallLayout {
    /// Whether this layout needs the FL Studio installation directory.
    pub fn needs_install_dir(&self) -> bool {
        matches!(self, InstallLayout::SitePackages)
    }

    /// Destination directory that receives the script subdirectories.
    pub fn destination(&self, fl_dir: &Path, userprofile: &Path) -> PathBuf {
        match self {
            InstallLayout::SitePackages => fl_dir
                .join("Shared")
                .join("Python")
                .join("Lib")
                .join("site-packages")
                .join(PACKAGE_DIR),
            InstallLayout::Hardware => userprofile
                .join("Documents")
                .join("Image-Line")
                .join("FL Studio")
                .join("Settings")
                .join("Hardware"),
        }
    }
}

/// The user's profile directory: `USERPROFILE`, falling back to the home directory.
pub fn userprofile_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Fixed list of installation directories probed in order.
pub fn default_candidate_dirs(platform: Platform, userprofile: &Path) -> Vec<PathBuf> {
    const VERSIONS: [&str; 3] = ["FL Studio 2024", "FL Studio 21", "FL Studio 20"];

    match platform {
        Platform::Windows => {
            let mut dirs: Vec<PathBuf> = VERSIONS
                .iter()
                .map(|v| PathBuf::from(r"C:\Program Files\Image-Line").join(v))
                .collect();
            dirs.extend(
                VERSIONS[1..]
                    .iter()
                    .map(|v| PathBuf::from(r"C:\Program Files (x86)\Image-Line").join(v)),
            );
            dirs.push(userprofile.join("Image-Line").join("FL Studio"));
            dirs
        }
        Platform::WSL => VERSIONS
            .iter()
            .map(|v| PathBuf::from("/mnt/c/Program Files/Image-Line").join(v))
            .chain(
                VERSIONS[1..]
                    .iter()
                    .map(|v| PathBuf::from("/mnt/c/Program Files (x86)/Image-Line").join(v)),
            )
            .collect(),
        Platform::MacOS => VERSIONS
            .iter()
            .map(|v| {
                PathBuf::from("/Applications")
                    .join(format!("{v}.app"))
                    .join("Contents")
                    .join("Resources")
                    .join("FL")
            })
            .collect(),
        Platform::Linux => Vec::new(),
    }
}
