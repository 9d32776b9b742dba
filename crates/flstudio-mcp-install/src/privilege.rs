//! Administrator privilege detection.

use tracing::debug;

/// Answers whether the current process may write into FL Studio's directory.
pub trait PrivilegeCheck {
    /// True when the process runs elevated (administrator on Windows, root elsewhere).
    fn is_elevated(&self) -> bool;
}

/// Queries the operating system.
///
/// Windows uses the `net session` probe, which only succeeds from an
/// elevated shell. Unix compares the effective uid with 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrivilegeCheck;

impl PrivilegeCheck for SystemPrivilegeCheck {
    #[cfg(windows)]
    fn is_elevated(&self) -> bool {
        use std::process::{Command, Stdio};

        let status = Command::new("net")
            .arg("session")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        debug!("net session probe: {:?}", status);
        matches!(status, Ok(s) if s.success())
    }

    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        debug!("effective uid: {}", euid);
        euid == 0
    }

    #[cfg(not(any(windows, unix)))]
    fn is_elevated(&self) -> bool {
        debug!("privilege probe unsupported on this platform");
        false
    }
}

impl<F> PrivilegeCheck for F
where
    F: Fn() -> bool,
{
    fn is_elevated(&self) -> bool {
        self()
    }
}
