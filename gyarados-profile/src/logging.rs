//! Explicit logging handle shared by the store components.
//!
//! A [`LogHandle`] is created once by the host (usually with
//! [`LogHandle::open`]) and cloned into every component that logs. It is a
//! `log::Log` implementation as well, so the host can install the very same
//! handle as the process-wide `log` backend and keep using `log::info!`.
//!
//! File output goes to `<dir>/gyarados.log`, rotated at 5 MiB with three
//! numbered backups (`gyarados.log.1` is the most recent).

use chrono::Local;
pub use log::Level;
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the active log file inside the log directory.
pub const LOG_FILE_NAME: &str = "gyarados.log";
/// Size at which the active log file is rotated.
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
/// Number of rotated files kept next to the active one.
pub const LOG_BACKUPS: usize = 3;

/// Cloneable handle to a log sink.
#[derive(Clone)]
pub struct LogHandle {
    inner: Arc<Inner>,
}

struct Inner {
    level: LevelFilter,
    sink: Sink,
}

enum Sink {
    /// Size-rotated file; `None` once the handle has been closed.
    File(Mutex<Option<RotatingFile>>),
    /// Forward to whatever `log::logger()` is installed.
    Global,
    Discard,
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match &self.inner.sink {
            Sink::File(_) => "file",
            Sink::Global => "global",
            Sink::Discard => "discard",
        };
        f.debug_struct("LogHandle")
            .field("level", &self.inner.level)
            .field("sink", &sink)
            .finish()
    }
}

impl LogHandle {
    /// Open (or append to) `<dir>/gyarados.log`, creating `dir` if needed.
    pub fn open(dir: &Path, level: LevelFilter) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = RotatingFile::open(dir.join(LOG_FILE_NAME), MAX_LOG_BYTES, LOG_BACKUPS)?;
        Ok(Self::with_sink(level, Sink::File(Mutex::new(Some(file)))))
    }

    /// Forward every record to the process-wide `log` backend.
    pub fn global() -> Self {
        Self::with_sink(LevelFilter::Trace, Sink::Global)
    }

    /// Drop every record.
    pub fn discard() -> Self {
        Self::with_sink(LevelFilter::Off, Sink::Discard)
    }

    fn with_sink(level: LevelFilter, sink: Sink) -> Self {
        Self {
            inner: Arc::new(Inner { level, sink }),
        }
    }

    /// The most verbose level this handle records.
    pub fn level(&self) -> LevelFilter {
        self.inner.level
    }

    /// Path of the active log file, for file-backed handles.
    pub fn file_path(&self) -> Option<PathBuf> {
        match &self.inner.sink {
            Sink::File(file) => file.lock().as_ref().map(|f| f.path.clone()),
            _ => None,
        }
    }

    /// Install this handle as the process-wide `log` backend.
    ///
    /// A `global()` handle cannot be installed (it would forward to itself).
    pub fn install_global(&self) -> Result<(), log::SetLoggerError> {
        if matches!(self.inner.sink, Sink::Global) {
            return Ok(());
        }
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.inner.level);
        Ok(())
    }

    /// Record a message under `target` (a short category such as `"PROFILE"`).
    pub fn emit(&self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        if level > self.inner.level {
            return;
        }
        let record = Record::builder()
            .level(level)
            .target(target)
            .args(args)
            .build();
        self.dispatch(&record);
    }

    fn dispatch(&self, record: &Record<'_>) {
        match &self.inner.sink {
            Sink::File(file) => {
                if let Some(file) = file.lock().as_mut() {
                    let line = format!(
                        "{} - {} - [{}] {}\n",
                        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        record.target(),
                        record.args()
                    );
                    // Logging must never take the caller down with it.
                    let _ = file.write_line(line.as_bytes());
                }
            }
            Sink::Global => log::logger().log(record),
            Sink::Discard => {}
        }
    }

    /// Flush buffered output to disk.
    pub fn flush_sink(&self) {
        match &self.inner.sink {
            Sink::File(file) => {
                if let Some(file) = file.lock().as_mut() {
                    let _ = file.file.flush();
                }
            }
            Sink::Global => log::logger().flush(),
            Sink::Discard => {}
        }
    }

    /// Flush and release the log file. Later records are dropped silently.
    pub fn close(&self) {
        if let Sink::File(file) = &self.inner.sink
            && let Some(mut file) = file.lock().take()
        {
            let _ = file.file.flush();
            let _ = file.file.sync_all();
        }
    }
}

impl Log for LogHandle {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.inner.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.dispatch(record);
        }
    }

    fn flush(&self) {
        self.flush_sink();
    }
}

/// Append-only file that rolls over to numbered backups past `max_bytes`.
struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
            backups,
        })
    }

    fn write_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + bytes.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }
        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                std::fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        std::fs::rename(&self.path, self.backup_path(1))?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

// Convenience macros mirroring `log::info!` etc. with an explicit handle and
// a category tag: `log_info!(self.log, "PROFILE", "loaded {}", name)`.
// Exported so hosts can log through the handle they pass around.

#[macro_export]
macro_rules! log_error {
    ($handle:expr, $target:expr, $($arg:tt)*) => {
        $handle.emit($crate::logging::Level::Error, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($handle:expr, $target:expr, $($arg:tt)*) => {
        $handle.emit($crate::logging::Level::Warn, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($handle:expr, $target:expr, $($arg:tt)*) => {
        $handle.emit($crate::logging::Level::Info, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($handle:expr, $target:expr, $($arg:tt)*) => {
        $handle.emit($crate::logging::Level::Debug, $target, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_log(dir: &Path) -> String {
        std::fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap()
    }

    #[test]
    fn test_file_sink_writes_target_and_level() {
        let temp = tempdir().unwrap();
        let log = LogHandle::open(temp.path(), LevelFilter::Info).unwrap();

        log_info!(log, "PROFILE", "loaded {}", "work");
        log.flush_sink();

        let contents = read_log(temp.path());
        assert!(contents.contains("INFO - [PROFILE] loaded work"));
    }

    #[test]
    fn test_level_filtering() {
        let temp = tempdir().unwrap();
        let log = LogHandle::open(temp.path(), LevelFilter::Warn).unwrap();

        log_debug!(log, "STORE", "noisy detail");
        log_warn!(log, "STORE", "worth knowing");
        log_error!(log, "STORE", "broken");
        log.flush_sink();

        let contents = read_log(temp.path());
        assert!(!contents.contains("noisy detail"));
        assert!(contents.contains("worth knowing"));
        assert!(contents.contains("broken"));
    }

    #[test]
    fn test_close_drops_later_records() {
        let temp = tempdir().unwrap();
        let log = LogHandle::open(temp.path(), LevelFilter::Info).unwrap();

        log_info!(log, "APP", "before close");
        log.close();
        log_info!(log, "APP", "after close");

        let contents = read_log(temp.path());
        assert!(contents.contains("before close"));
        assert!(!contents.contains("after close"));
        assert!(log.file_path().is_none());
    }

    #[test]
    fn test_clones_share_the_sink() {
        let temp = tempdir().unwrap();
        let log = LogHandle::open(temp.path(), LevelFilter::Info).unwrap();
        let clone = log.clone();

        log_info!(clone, "HISTORY", "from clone");
        log.close();
        log_info!(clone, "HISTORY", "after original closed");

        let contents = read_log(temp.path());
        assert!(contents.contains("from clone"));
        assert!(!contents.contains("after original closed"));
    }

    #[test]
    fn test_rotation_keeps_numbered_backups() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(LOG_FILE_NAME);
        let mut file = RotatingFile::open(path.clone(), 64, 2).unwrap();

        for i in 0..10 {
            file.write_line(format!("line number {i:02} of the test\n").as_bytes())
                .unwrap();
        }

        assert!(path.exists());
        assert!(temp.path().join("gyarados.log.1").exists());
        assert!(temp.path().join("gyarados.log.2").exists());
        assert!(!temp.path().join("gyarados.log.3").exists());

        let current = std::fs::read_to_string(&path).unwrap();
        assert!(current.contains("line number 09"));
        assert!(current.len() as u64 <= 64);
    }

    #[test]
    fn test_discard_handle_is_silent() {
        let log = LogHandle::discard();
        assert_eq!(log.level(), LevelFilter::Off);
        log_error!(log, "APP", "nobody hears this");
        assert!(log.file_path().is_none());
    }
}
