//! Crash-safe persistence of JSON documents and raw blobs.
//!
//! Every write lands in `<file>.tmp` next to the destination (same directory,
//! hence same filesystem), is flushed to disk, then renamed over the
//! destination. A reader therefore sees either the previous committed version
//! or the new one, never a partial file. No locking is done beyond that:
//! concurrent writers to the same path are the caller's problem.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Path of the temporary file used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Open (or create/truncate) a file for writing with owner-only permissions
/// (0o600) on Unix, or default permissions on other platforms.
fn open_restricted_write(path: &Path) -> std::io::Result<std::fs::File> {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// A fully written temporary file that has not yet replaced its destination.
///
/// Dropping it without [`StagedWrite::commit`] removes the temporary file and
/// leaves the destination untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Atomically replace the destination with the staged contents.
    pub fn commit(mut self) -> Result<()> {
        if let Err(e) = std::fs::rename(&self.temp, &self.dest) {
            let _ = std::fs::remove_file(&self.temp);
            self.committed = true;
            return Err(StoreError::io(&self.dest, e));
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.temp);
        }
    }
}

/// Write `bytes` to the temporary file for `path` without touching `path`.
///
/// Creates parent directories as needed.
pub fn stage(path: &Path, bytes: &[u8]) -> Result<StagedWrite> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let temp = temp_path_for(path);
    let staged = StagedWrite {
        temp: temp.clone(),
        dest: path.to_path_buf(),
        committed: false,
    };

    let mut file = open_restricted_write(&temp).map_err(|e| StoreError::io(&temp, e))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::io(&temp, e))?;

    Ok(staged)
}

/// Atomically replace `path` with `bytes`.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    stage(path, bytes)?.commit()
}

/// Read `path`, returning `None` when it does not exist.
pub fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &bytes)
}

/// Read and parse `path`.
///
/// Returns `None` if the file does not exist or is blank; an error if it
/// exists but cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(bytes) = read_bytes(path)? else {
        return Ok(None);
    };
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}
