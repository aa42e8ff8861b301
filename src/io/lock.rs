//! Lock file management for single-instance enforcement.
//!
//! Only one process may own the camera and the sensor pin. The lock is an
//! advisory `flock` on a file in the runtime directory holding the owner's PID.
//! The kernel drops the lock when the owner dies, so a leftover file from a
//! crashed run never blocks the next start.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::{APP_NAME, LOCK_FILE_NAME};
use crate::common::utils::private_path;

/// Held for the lifetime of the process; unlocks and removes the file on drop.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `$XDG_RUNTIME_DIR/birdorsquirrel.lock`, falling back to `/tmp`.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Acquire an exclusive lock on `path`, failing if another instance holds it.
pub fn acquire_lock(path: &Path) -> Result<LockFile> {
    // Open without truncating so a running owner's PID survives a failed attempt
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", private_path(path)))?;

    if file.try_lock_exclusive().is_err() {
        let owner = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| content.lines().next().map(str::trim).map(String::from))
            .filter(|pid| !pid.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        bail!("{APP_NAME} is already running (PID: {owner})");
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;

    Ok(LockFile {
        file,
        path: path.to_path_buf(),
    })
}
