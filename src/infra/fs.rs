//! Filesystem utilities for reading and replacing files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Reads the entire contents of a file as bytes.
///
/// A missing file maps to `Ok(None)` so callers can decide whether absence
/// is an error (objects) or a valid state (a fresh index, an unborn branch).
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Option<Vec<u8>>> {
    match fs::read(path.as_ref()) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Writes data to a file atomically.
///
/// The data goes to a temporary sibling first and is then renamed over the
/// target, so readers never observe a partial file.
pub fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let temp_path = sibling(path, |name| {
        format!(".{}.{}.tmp", name, std::process::id())
    });

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Replaces a file under a `<name>.lock` advisory lock.
///
/// The lock file is created exclusively, filled, and renamed over the
/// target. If the lock already exists another writer is active and
/// `Error::Locked` is returned without touching the target.
pub fn write_file_locked<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let lock_path = sibling(path, |name| format!("{}.lock", name));

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&lock_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::Locked(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let written = file
        .write_all(data)
        .and_then(|_| file.sync_all())
        .and_then(|_| fs::rename(&lock_path, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&lock_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn sibling(path: &Path, name: impl FnOnce(&str) -> String) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "temp".to_string());
    path.with_file_name(name(&file_name))
}
