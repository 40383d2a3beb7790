//! Injected log sinks
//!
//! The decoding engine never touches a process-wide log file. It is handed
//! a [`LogSink`] and writes leveled messages through it, so several engine
//! instances can run side by side with separate sinks.
//!
//! Console output always goes through `tracing`; [`FileSink`] additionally
//! appends to a durable file behind a mutex so concurrent workers never
//! interleave partial lines.

use crate::config::LoggingConfig;
use crate::persist::ensure_parent_dir;
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;

/// Leveled write capability handed to the engine
pub trait LogSink: Send + Sync {
    /// Record `message` at `level`
    fn write(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.write(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.write(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.write(Level::ERROR, message);
    }
}

/// Shared handle to a log sink
pub type SharedLogSink = Arc<dyn LogSink>;

fn emit_tracing(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{}", message),
        Level::WARN => tracing::warn!("{}", message),
        Level::INFO => tracing::info!("{}", message),
        Level::DEBUG => tracing::debug!("{}", message),
        _ => tracing::trace!("{}", message),
    }
}

/// Console-only sink forwarding to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: Level, message: &str) {
        emit_tracing(level, message);
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _level: Level, _message: &str) {}
}

/// Append-only file sink, mirrored to `tracing`
///
/// Entries are formatted `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` and flushed
/// one at a time while holding the writer lock.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open (or create) `path` for appending, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_entry(level: Level, message: &str) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        format!("[{}] [{}] {}", timestamp, level, message)
    }
}

impl LogSink for FileSink {
    fn write(&self, level: Level, message: &str) {
        emit_tracing(level, message);

        let entry = Self::format_entry(level, message);
        // A poisoned lock only means another writer panicked mid-entry;
        // the file handle itself is still usable.
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", entry).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to append to log file {}: {}", self.path.display(), e);
        }
    }
}

/// Build the sink described by the `logging` configuration section
///
/// Disabled logging yields a [`NullSink`]. A log file that cannot be opened
/// falls back to console-only output with a warning.
pub fn sink_from_config(config: &LoggingConfig) -> SharedLogSink {
    if !config.enabled {
        return Arc::new(NullSink);
    }
    match FileSink::open(&config.file) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!(
                "Cannot open log file {}: {}. Logging to console only.",
                config.file.display(),
                e
            );
            Arc::new(TracingSink)
        }
    }
}

/// Install the global `tracing` subscriber for a binary
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    // Ignore "already set" so tests and repeated calls do not panic
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
