//! Filesystem utilities.
//!
//! Helper functions for file operations.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// True when `path` is missing or a directory without children.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(std::fs::read_dir(path)?.next().is_none())
}

/// Copy a file or directory tree to `dst`. Symlinks are recreated, not followed.
pub fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(src)?;
    if !meta.is_dir() {
        if let Some(parent) = dst.parent() {
            ensure_dir(parent)?;
        }
        copy_leaf(src, dst, &meta)?;
        return Ok(());
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        let target = dst.join(relative);
        let meta = std::fs::symlink_metadata(entry.path())?;
        if meta.is_dir() {
            ensure_dir(&target)?;
        } else {
            copy_leaf(entry.path(), &target, &meta)?;
        }
    }
    Ok(())
}

fn copy_leaf(src: &Path, dst: &Path, meta: &std::fs::Metadata) -> Result<()> {
    if meta.file_type().is_symlink() {
        let link = std::fs::read_link(src)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&link, dst)?;
        #[cfg(not(unix))]
        std::fs::copy(src, dst).map(|_| ())?;
        return Ok(());
    }
    std::fs::copy(src, dst)?;
    Ok(())
}

/// Move `src` to `dst`, falling back to copy + remove across filesystems.
pub fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    tracing::debug!(
        "rename {} -> {} failed, copying instead",
        src.display(),
        dst.display()
    );
    copy_recursive(src, dst)?;
    if std::fs::symlink_metadata(src)?.is_dir() {
        std::fs::remove_dir_all(src)?;
    } else {
        std::fs::remove_file(src)?;
    }
    Ok(())
}

/// Total size in bytes of regular files under `path`.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter(std::fs::Metadata::is_file)
        .map(|meta| meta.len())
        .sum()
}

/// Add the executable bits to a file.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
