//! Structured logging with an explicitly passed sink.
//!
//! Every component that logs receives an `Arc<dyn Log>` instead of reaching for
//! process-wide state. The production [`Logger`] writes two renderings of each
//! record:
//!
//! - **Console**: box-drawing output (`┣[INFO] message`) with
//!   ANSI colors, suitable for a terminal or the systemd journal.
//! - **File** (optional): plain `YYYY-MM-DD HH:MM:SS,mmm LEVEL message` lines
//!   appended by a background writer thread, flushed when the
//!   [`LoggerGuard`] is dropped.
//!
//! [`MemoryLog`] keeps records in memory so tests can assert on what the
//! controller reported.
//!
//! ## Logging Conventions
//!
//! - `log_info!` for state the operator cares about (motion, picture taken,
//!   post sent, skips).
//! - `log_debug!` for per-transition detail; only shown with `--debug`.
//! - `log_warning!` for degraded-but-running conditions.
//! - `log_error!` for failures that end the process.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    fn ansi_color(&self) -> &'static str {
        match self {
            Level::Debug | Level::Info => "\x1b[32m",
            Level::Warning => "\x1b[33m",
            Level::Error => "\x1b[31m",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observability collaborator passed to every component.
pub trait Log: Send + Sync {
    /// Record a single message at the given level.
    fn record(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

enum LogMessage {
    Line(String),
    Shutdown,
}

/// Console logger with an optional append-only file sink.
pub struct Logger {
    debug_enabled: bool,
    console: bool,
    file: Mutex<Option<Sender<LogMessage>>>,
}

impl Logger {
    /// Console-only logger. Debug records are dropped unless `debug_enabled`.
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            console: true,
            file: Mutex::new(None),
        }
    }

    /// Suppress console output (file output, if any, is unaffected).
    pub fn quiet(mut self) -> Self {
        self.console = false;
        self
    }

    /// Start appending records to `path` on a writer thread.
    ///
    /// The returned guard must be kept alive for as long as records should
    /// reach the file; dropping it flushes and joins the writer.
    pub fn start_file_logging(&self, path: &Path) -> Result<LoggerGuard> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        let (tx, rx) = channel();
        let handle = std::thread::spawn(move || {
            loop {
                match rx.recv() {
                    Ok(LogMessage::Line(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        });

        let mut slot = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("Logger file slot poisoned"))?;
        *slot = Some(tx.clone());

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
            path: path.to_path_buf(),
        })
    }

    fn write_console(&self, level: Level, message: &str) {
        let color = level.ansi_color();
        let line = format!("┣[{color}{level}\x1b[0m] {message}\n");
        print!("{line}");
        let _ = std::io::stdout().flush();
    }
}

impl Log for Logger {
    fn record(&self, level: Level, message: &str) {
        if level == Level::Debug && !self.debug_enabled {
            return;
        }

        if self.console {
            self.write_console(level, message);
        }

        if let Ok(slot) = self.file.lock()
            && let Some(tx) = slot.as_ref()
        {
            let _ = tx.send(LogMessage::Line(format_file_line(level, message)));
        }
    }
}

/// Render a record the way it lands in the log file.
pub fn format_file_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
    format!("{timestamp} {level} {message}\n")
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
    path: PathBuf,
}

impl LoggerGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// In-memory sink, mostly for tests.
#[derive(Default, Clone)]
pub struct MemoryLog {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// True if any record at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl Log for MemoryLog {
    fn record(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}

// # Logging Macros

/// Log an informational message through the given sink.
#[macro_export]
macro_rules! log_info {
    ($log:expr, $($arg:tt)*) => {{
        $crate::logger::Log::info(&*$log, &format!($($arg)*));
    }};
}

/// Log a debug message through the given sink.
#[macro_export]
macro_rules! log_debug {
    ($log:expr, $($arg:tt)*) => {{
        $crate::logger::Log::debug(&*$log, &format!($($arg)*));
    }};
}

/// Log a warning through the given sink.
#[macro_export]
macro_rules! log_warning {
    ($log:expr, $($arg:tt)*) => {{
        $crate::logger::Log::warning(&*$log, &format!($($arg)*));
    }};
}

/// Log an error through the given sink.
#[macro_export]
macro_rules! log_error {
    ($log:expr, $($arg:tt)*) => {{
        $crate::logger::Log::error(&*$log, &format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_line_format() {
        let line = format_file_line(Level::Info, "Picture taken.");
        // 2024-01-01 12:00:00,000 INFO Picture taken.
        let (stamp, rest) = line.split_at(23);
        assert_eq!(rest, " INFO Picture taken.\n");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[19..20], ",");
    }

    #[test]
    fn test_file_logging_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("birdorsquirrel.log");
        std::fs::write(&path, "existing line\n").unwrap();

        let logger = Logger::new(false).quiet();
        {
            let _guard = logger.start_file_logging(&path).unwrap();
            logger.info("Motion detected.");
            logger.debug("hidden without --debug");
            logger.error("boom");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].ends_with("INFO Motion detected."));
        assert!(lines[2].ends_with("ERROR boom"));
    }

    #[test]
    fn test_memory_log_macros() {
        let log: Arc<dyn Log> = Arc::new(MemoryLog::new());
        let memory = MemoryLog::new();
        let shared: Arc<dyn Log> = Arc::new(memory.clone());
        log_info!(shared, "Tweet sent to {}", "@feeder");
        log_warning!(shared, "low light");
        log_info!(log, "unrelated");

        assert!(memory.contains(Level::Info, "Tweet sent to @feeder"));
        assert!(memory.contains(Level::Warning, "low light"));
        assert_eq!(memory.records().len(), 2);
    }
}
