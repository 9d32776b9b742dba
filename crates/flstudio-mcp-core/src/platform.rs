//! Platform detection for locating FL Studio installations.
//!
//! FL Studio ships for Windows and macOS. Under WSL the Windows install is
//! reachable through `/mnt/c`, so WSL is treated as its own platform.

use serde::{Deserialize, Serialize};

/// Platforms the installer knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Native Linux (not WSL)
    Linux,
    /// macOS
    MacOS,
    /// Native Windows
    Windows,
    /// Windows Subsystem for Linux
    WSL,
}

impl Platform {
    /// Detect the current platform at runtime.
    ///
    /// - **WSL**: `/proc/version` mentions "microsoft", or `WSLInterop` exists
    /// - **Linux**: target_os = "linux" and not WSL
    /// - **macOS**: target_os = "macos"
    /// - **Windows**: everything else built with `cfg(windows)`
    ///
    /// # Examples
    ///
    /// ```
    /// use flstudio_mcp_core::Platform;
    ///
    /// let platform = Platform::detect();
    /// println!("Running on: {}", platform);
    /// ```
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            if Self::is_wsl() {
                return Platform::WSL;
            }
            Platform::Linux
        }

        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }

        #[cfg(windows)]
        {
            Platform::Windows
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
        {
            Platform::Linux
        }
    }

    #[cfg(target_os = "linux")]
    fn is_wsl() -> bool {
        if let Ok(version) = std::fs::read_to_string("/proc/version") {
            if version.to_lowercase().contains("microsoft") {
                return true;
            }
        }

        std::path::Path::new("/proc/sys/fs/binfmt_misc/WSLInterop").exists()
    }

    /// Get the platform name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::WSL => "WSL",
        }
    }

    /// Whether FL Studio can be installed natively or through a mounted Windows drive.
    pub fn supports_fl_studio(&self) -> bool {
        !matches!(self, Platform::Linux)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();
        assert!(matches!(
            platform,
            Platform::Linux | Platform::MacOS | Platform::Windows | Platform::WSL
        ));
    }

    #[test]
    fn test_supports_fl_studio() {
        assert!(Platform::Windows.supports_fl_studio());
        assert!(Platform::MacOS.supports_fl_studio());
        assert!(Platform::WSL.supports_fl_studio());
        assert!(!Platform::Linux.supports_fl_studio());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Platform::MacOS), "macOS");
        assert_eq!(format!("{}", Platform::WSL), "WSL");
    }
}
