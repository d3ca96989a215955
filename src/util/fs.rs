//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Write a script and mark it executable (0o755 on unix).
pub fn write_executable(path: &Path, contents: &str) -> Result<()> {
    write_string(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to make executable: {}", path.display()))?;
    }

    Ok(())
}

/// File stems of every `*.<ext>` file directly inside `dir`.
///
/// A missing directory yields an empty list.
pub fn file_stems_with_extension(dir: &Path, ext: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = dir.join(format!("*.{}", ext));
    let pattern_str = pattern.to_string_lossy();

    let mut stems = Vec::new();
    for entry in glob(&pattern_str)
        .with_context(|| format!("invalid glob pattern: {}", pattern_str))?
    {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(stem) = path.file_stem() {
                        stems.push(stem.to_string_lossy().into_owned());
                    }
                }
            }
            Err(e) => {
                tracing::warn!("glob error: {}", e);
            }
        }
    }

    stems.sort();
    stems.dedup();
    Ok(stems)
}

/// Point `dst` at `src`, replacing any previous link, file, or directory at `dst`.
///
/// Returns `false` without touching `dst` when `src` does not exist.
pub fn replace_link(src: &Path, dst: &Path) -> Result<bool> {
    if !src.exists() {
        return Ok(false);
    }

    let existing = fs::symlink_metadata(dst);
    if let Ok(meta) = existing {
        if meta.file_type().is_symlink() || meta.is_file() {
            fs::remove_file(dst)
                .with_context(|| format!("failed to remove link: {}", dst.display()))?;
        } else if meta.is_dir() {
            fs::remove_dir_all(dst)
                .with_context(|| format!("failed to remove directory: {}", dst.display()))?;
        }
    }

    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    tracing::info!("linking {} -> {}", src.display(), dst.display());
    symlink(src, dst)
        .with_context(|| format!("failed to link {} -> {}", src.display(), dst.display()))?;
    Ok(true)
}

/// Render a path with forward slashes, as CMake and sh expect.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Join a path onto `base` unless it is already absolute.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}
