//! Install and uninstall flows.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use flstudio_mcp_core::{BundledScript, Error, InstallLayout, Result};

use crate::bundle::script_source;
use crate::copy::{copy_tree, remove_tree, CopyStats};
use crate::locate::{locate_install_dir, Location, PathPrompt};
use crate::privilege::PrivilegeCheck;

/// Inputs to [`install`] and [`uninstall`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Scripts to install, in order
    pub scripts: Vec<BundledScript>,
    /// Destination layout
    pub layout: InstallLayout,
    /// FL Studio directory given by the operator (skips probing)
    pub fl_dir: Option<PathBuf>,
    /// Directories probed when `fl_dir` is not set
    pub candidate_dirs: Vec<PathBuf>,
    /// Directory containing the bundled script folders
    pub bundle_root: PathBuf,
    /// The user's profile directory
    pub userprofile: PathBuf,
}

impl InstallOptions {
    /// Options installing every bundled script with the default layout.
    pub fn new(bundle_root: impl Into<PathBuf>, userprofile: impl Into<PathBuf>) -> Self {
        Self {
            scripts: BundledScript::all().to_vec(),
            layout: InstallLayout::default(),
            fl_dir: None,
            candidate_dirs: Vec::new(),
            bundle_root: bundle_root.into(),
            userprofile: userprofile.into(),
        }
    }

    fn unique_scripts(&self) -> Vec<BundledScript> {
        let mut scripts: Vec<BundledScript> = Vec::with_capacity(self.scripts.len());
        for script in &self.scripts {
            if !scripts.contains(script) {
                scripts.push(*script);
            }
        }
        scripts
    }
}

/// Result of installing one script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    /// Which script
    pub script: BundledScript,
    /// Where it now lives
    pub path: PathBuf,
    /// Whether a previous copy was deleted first
    pub replaced_previous: bool,
    /// Copy totals
    pub stats: CopyStats,
}

/// Result of a successful [`install`].
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// FL Studio directory, when the layout needs one
    pub location: Option<Location>,
    /// Directory that received the scripts
    pub destination: PathBuf,
    /// One entry per installed script
    pub scripts: Vec<ScriptReport>,
    /// Completion time
    pub installed_at: DateTime<Utc>,
}

impl InstallReport {
    /// Files copied across all scripts.
    pub fn total_files(&self) -> usize {
        self.scripts.iter().map(|s| s.stats.files).sum()
    }

    /// Operator instructions for enabling the scripts in FL Studio.
    pub fn next_steps(&self, userprofile: &Path) -> Vec<String> {
        let mut steps = vec![
            "Start FL Studio and open Options > MIDI settings.".to_string(),
            "Pick an input port and select the installed script as Controller type.".to_string(),
        ];
        for script in &self.scripts {
            steps.push(format!(
                "{} logs to {}",
                script.script,
                script.script.log_path(userprofile).display()
            ));
        }
        steps
    }
}

/// Result of [`uninstall`].
#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    /// Directory the scripts were removed from
    pub destination: PathBuf,
    /// Script directories deleted
    pub removed: Vec<PathBuf>,
    /// Scripts that were not installed
    pub missing: Vec<BundledScript>,
}

fn require_elevation(privileges: &dyn PrivilegeCheck) -> Result<()> {
    if privileges.is_elevated() {
        Ok(())
    } else {
        error!("Administrator privileges are required");
        Err(Error::NotElevated)
    }
}

fn resolve_destination(
    options: &InstallOptions,
    prompt: &mut dyn PathPrompt,
) -> Result<(Option<Location>, PathBuf)> {
    let location = if options.layout.needs_install_dir() {
        Some(locate_install_dir(
            options.fl_dir.as_deref(),
            &options.candidate_dirs,
            prompt,
        )?)
    } else {
        None
    };
    let fl_dir = location
        .as_ref()
        .map(|l| l.path.as_path())
        .unwrap_or_else(|| Path::new(""));
    let destination = options.layout.destination(fl_dir, &options.userprofile);
    Ok((location, destination))
}

/// Install the bundled scripts.
///
/// Nothing on disk changes unless the process is elevated and every
/// bundled script directory exists. A previous copy of a script is deleted
/// before the fresh copy, so no stale files survive.
#[instrument(skip_all, fields(layout = ?options.layout))]
pub fn install(
    options: &InstallOptions,
    privileges: &dyn PrivilegeCheck,
    prompt: &mut dyn PathPrompt,
) -> Result<InstallReport> {
    require_elevation(privileges)?;

    let scripts = options.unique_scripts();
    let sources = scripts
        .iter()
        .map(|script| Ok((*script, script_source(&options.bundle_root, *script)?)))
        .collect::<Result<Vec<_>>>()?;

    let (location, destination) = resolve_destination(options, prompt)?;

    if !destination.is_dir() {
        info!("Creating {}", destination.display());
        fs::create_dir_all(&destination).map_err(|e| Error::fs(&destination, e))?;
    }

    let mut reports = Vec::with_capacity(sources.len());
    for (script, source) in sources {
        let target = destination.join(script.dir_name());

        let replaced_previous = remove_tree(&target)?;
        if replaced_previous {
            info!("Removed previous installation at {}", target.display());
        }

        let stats = copy_tree(&source, &target)?;
        info!(
            "Installed {} ({} files) to {}",
            script,
            stats.files,
            target.display()
        );
        reports.push(ScriptReport {
            script,
            path: target,
            replaced_previous,
            stats,
        });
    }

    Ok(InstallReport {
        location,
        destination,
        scripts: reports,
        installed_at: Utc::now(),
    })
}

/// Remove installed scripts.
///
/// With the site-packages layout the `flmcp` package directory is removed
/// too once it is empty.
#[instrument(skip_all, fields(layout = ?options.layout))]
pub fn uninstall(
    options: &InstallOptions,
    privileges: &dyn PrivilegeCheck,
    prompt: &mut dyn PathPrompt,
) -> Result<UninstallReport> {
    require_elevation(privileges)?;

    let (_, destination) = resolve_destination(options, prompt)?;

    let mut removed = Vec::new();
    let mut missing = Vec::new();
    for script in options.unique_scripts() {
        let target = destination.join(script.dir_name());
        if remove_tree(&target)? {
            info!("Removed {}", target.display());
            removed.push(target);
        } else {
            warn!("{} is not installed", script);
            missing.push(script);
        }
    }

    if options.layout == InstallLayout::SitePackages {
        let empty = fs::read_dir(&destination)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            fs::remove_dir(&destination).map_err(|e| Error::fs(&destination, e))?;
        }
    }

    Ok(UninstallReport {
        destination,
        removed,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_scripts_keeps_first_occurrence() {
        let mut options = InstallOptions::new("/bundle", "/home/u");
        options.scripts = vec![
            BundledScript::PlayPauseTest,
            BundledScript::RemoteScript,
            BundledScript::PlayPauseTest,
        ];
        assert_eq!(
            options.unique_scripts(),
            vec![BundledScript::PlayPauseTest, BundledScript::RemoteScript]
        );
    }

    #[test]
    fn next_steps_mention_log_files() {
        let report = InstallReport {
            location: None,
            destination: PathBuf::from("/dest"),
            scripts: vec![ScriptReport {
                script: BundledScript::RemoteScript,
                path: PathBuf::from("/dest/FlStudioMCP_Remote_Script"),
                replaced_previous: false,
                stats: CopyStats::default(),
            }],
            installed_at: Utc::now(),
        };
        let steps = report.next_steps(Path::new("/home/u"));
        assert!(steps.iter().any(|s| s.contains("flstudio_mcp.log")));
        assert_eq!(report.total_files(), 0);
    }
}
