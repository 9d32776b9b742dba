//! Recursive directory copy and removal.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use flstudio_mcp_core::{Error, Result};

/// Attempts for removals, which fail transiently on Windows while FL Studio
/// or an antivirus scanner holds a handle.
const REMOVE_ATTEMPTS: usize = 4;

/// Totals for a [`copy_tree`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    /// Regular files copied
    pub files: usize,
    /// Directories created (including the root)
    pub dirs: usize,
    /// Bytes copied
    pub bytes: u64,
}

fn retry<F>(mut op: F, attempts: usize) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let mut delay = Duration::from_millis(200);
    for i in 0..attempts {
        match op() {
            Ok(()) => return Ok(()),
            Err(err) => {
                if i + 1 == attempts {
                    return Err(err);
                }
                warn!("attempt {} failed: {}", i + 1, err);
            }
        }
        std::thread::sleep(delay);
        delay = std::cmp::min(delay * 2, Duration::from_secs(2));
    }
    Ok(())
}

/// What a directory entry is, with symlinks classified by their target.
enum EntryKind {
    Dir,
    File,
    /// Symlink to a directory; never descended into, so link cycles terminate
    LinkedDir,
}

fn classify(entry: &fs::DirEntry) -> Result<EntryKind> {
    let path = entry.path();
    let file_type = entry.file_type().map_err(|e| Error::fs(&path, e))?;
    if file_type.is_dir() {
        Ok(EntryKind::Dir)
    } else if file_type.is_symlink() && path.is_dir() {
        Ok(EntryKind::LinkedDir)
    } else {
        Ok(EntryKind::File)
    }
}

/// Copy `src` into `dst` recursively, creating `dst` and every subdirectory.
///
/// Symlinks to files are copied as regular files; symlinks to directories
/// are skipped. Existing files at the destination are overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    copy_dir(src, dst, &mut stats)?;
    debug!(
        "copied {} -> {}: {} files, {} dirs, {} bytes",
        src.display(),
        dst.display(),
        stats.files,
        stats.dirs,
        stats.bytes
    );
    Ok(stats)
}

fn copy_dir(src: &Path, dst: &Path, stats: &mut CopyStats) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::fs(dst, e))?;
    stats.dirs += 1;

    let entries = fs::read_dir(src).map_err(|e| Error::fs(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::fs(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        match classify(&entry)? {
            EntryKind::Dir => copy_dir(&from, &to, stats)?,
            EntryKind::LinkedDir => warn!("Skipping directory symlink {}", from.display()),
            EntryKind::File => {
                stats.bytes += fs::copy(&from, &to).map_err(|e| Error::fs(&from, e))?;
                stats.files += 1;
            }
        }
    }
    Ok(())
}

/// Delete `path` and everything below it.
///
/// Returns `false` when there was nothing to delete.
pub fn remove_tree(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    retry(
        || {
            let removed = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|e| Error::fs(path, e))
        },
        REMOVE_ATTEMPTS,
    )?;
    Ok(true)
}

/// Every regular file below `root` as `(relative path, size)`, sorted.
pub fn tree_listing(root: &Path) -> Result<Vec<(PathBuf, u64)>> {
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, u64)>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|e| Error::fs(dir, e))? {
        let entry = entry.map_err(|e| Error::fs(dir, e))?;
        let path = entry.path();
        match classify(&entry)? {
            EntryKind::Dir => walk(root, &path, out)?,
            EntryKind::LinkedDir => {}
            EntryKind::File => {
                let size = fs::metadata(&path).map_err(|e| Error::fs(&path, e))?.len();
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.push((relative, size));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::write(root.join("__init__.py"), "print('hi')\n").unwrap();
        fs::write(root.join("sub").join("helpers.py"), "x = 1\n").unwrap();
        fs::write(root.join("sub").join("deeper").join("data.json"), "{}").unwrap();
    }

    #[test]
    fn copy_tree_copies_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("out").join("dst");
        sample_tree(&src);

        let stats = copy_tree(&src, &dst).unwrap();

        assert_eq!(stats.files, 3);
        assert_eq!(stats.dirs, 3);
        assert_eq!(stats.bytes, 12 + 6 + 2);
        assert_eq!(tree_listing(&src).unwrap(), tree_listing(&dst).unwrap());
        assert_eq!(
            fs::read_to_string(dst.join("sub").join("helpers.py")).unwrap(),
            "x = 1\n"
        );
    }

    #[test]
    fn copy_tree_missing_source_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let err = copy_tree(&missing, &tmp.path().join("dst")).unwrap_err();
        assert!(matches!(err, Error::Filesystem { ref path, .. } if path == &missing));
    }

    #[test]
    fn remove_tree_deletes_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("old");
        sample_tree(&dir);

        assert!(remove_tree(&dir).unwrap());
        assert!(!dir.exists());
        assert!(!remove_tree(&dir).unwrap());
    }

    #[test]
    fn remove_tree_handles_plain_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("stray");
        fs::write(&file, "x").unwrap();
        assert!(remove_tree(&file).unwrap());
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_survives_symlink_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        sample_tree(&src);
        std::os::unix::fs::symlink(&src, src.join("sub").join("loop")).unwrap();
        std::os::unix::fs::symlink(src.join("__init__.py"), src.join("alias.py")).unwrap();

        let stats = copy_tree(&src, &dst).unwrap();

        assert_eq!(stats.files, 4);
        assert!(!dst.join("sub").join("loop").exists());
        assert!(!fs::symlink_metadata(dst.join("alias.py"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(tree_listing(&src).unwrap(), tree_listing(&dst).unwrap());
    }

    #[test]
    fn tree_listing_is_relative_and_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        sample_tree(tmp.path());
        let listing = tree_listing(tmp.path()).unwrap();
        let names: Vec<PathBuf> = listing.into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("__init__.py"),
                PathBuf::from("sub").join("deeper").join("data.json"),
                PathBuf::from("sub").join("helpers.py"),
            ]
        );
    }
}
