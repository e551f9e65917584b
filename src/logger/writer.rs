//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr.
//! Each call writes one complete line under the target's lock, so concurrent
//! requests never interleave partial records.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Severity of a server log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a configured level name, falling back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Append to file
    File(File),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Access (audit) log target
    access: Mutex<LogTarget>,
    /// Server (diagnostic) log target
    server: Mutex<LogTarget>,
    /// Minimum level written to the server log
    level: Level,
}

impl LogWriter {
    /// Create a new log writer with optional file paths
    fn new(
        access_log_file: Option<&str>,
        server_log_file: Option<&str>,
        level: Level,
    ) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stdout,
        };

        let server = match server_log_file {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stderr,
        };

        Ok(Self {
            access: Mutex::new(access),
            server: Mutex::new(server),
            level,
        })
    }

    /// Write one line to the access log
    pub fn write_access(&self, message: &str) {
        if let Ok(mut target) = self.access.lock() {
            write_to_target(&mut target, message);
        }
    }

    /// Write one line to the server log
    pub fn write_server(&self, message: &str) {
        if let Ok(mut target) = self.server.lock() {
            write_to_target(&mut target, message);
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write message to log target; failures are dropped
fn write_to_target(target: &mut LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => write_line(&mut io::stdout().lock(), message),
        LogTarget::Stderr => write_line(&mut io::stderr().lock(), message),
        LogTarget::File(file) => write_line(file, message),
    }
}

/// A closed pipe or full disk must never take the request down with it
fn write_line(out: &mut impl Write, message: &str) {
    let _ = writeln!(out, "{message}");
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    access_log_file: Option<&str>,
    server_log_file: Option<&str>,
    level: Level,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, server_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer if it has been initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
