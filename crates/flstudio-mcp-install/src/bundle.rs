//! Locating the script folders shipped alongside the installer.

use std::path::{Path, PathBuf};

use flstudio_mcp_core::{BundledScript, Error, Result};

/// Environment variable overriding the bundle location.
pub const BUNDLE_ROOT_ENV: &str = "FLMCP_BUNDLE_ROOT";

/// Directory holding the bundled script folders.
///
/// Precedence: explicit override, then `FLMCP_BUNDLE_ROOT`, then the
/// directory of the running executable.
pub fn resolve_bundle_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(root) = std::env::var_os(BUNDLE_ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Other(format!("{} has no parent", exe.display())))
}

/// Source directory of one script, which must exist.
pub fn script_source(root: &Path, script: BundledScript) -> Result<PathBuf> {
    let dir = root.join(script.dir_name());
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(Error::BundleNotFound(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn explicit_root_wins() {
        let root = resolve_bundle_root(Some(Path::new("/srv/bundle"))).unwrap();
        assert_eq!(root, PathBuf::from("/srv/bundle"));
    }

    #[test]
    fn env_root_used_without_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let prior = std::env::var_os(BUNDLE_ROOT_ENV);

        std::env::set_var(BUNDLE_ROOT_ENV, "/opt/flmcp-bundle");
        let root = resolve_bundle_root(None).unwrap();
        assert_eq!(root, PathBuf::from("/opt/flmcp-bundle"));

        match prior {
            Some(v) => std::env::set_var(BUNDLE_ROOT_ENV, v),
            None => std::env::remove_var(BUNDLE_ROOT_ENV),
        }
    }

    #[test]
    fn falls_back_to_exe_dir() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let prior = std::env::var_os(BUNDLE_ROOT_ENV);
        std::env::remove_var(BUNDLE_ROOT_ENV);

        let root = resolve_bundle_root(None).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(root, exe.parent().unwrap());

        if let Some(v) = prior {
            std::env::set_var(BUNDLE_ROOT_ENV, v);
        }
    }

    #[test]
    fn missing_script_source_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = script_source(tmp.path(), BundledScript::RemoteScript).unwrap_err();
        assert!(matches!(err, Error::BundleNotFound(ref p) if p.ends_with("FlStudioMCP_Remote_Script")));

        std::fs::create_dir(tmp.path().join("FlStudioMCP_Remote_Script")).unwrap();
        assert!(script_source(tmp.path(), BundledScript::RemoteScript).is_ok());
    }
}
