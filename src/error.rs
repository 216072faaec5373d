use std::io;
use std::path::PathBuf;

/// Errors surfaced while constructing, flushing or wiring loggers.
///
/// Construction errors are always returned to the caller that asked for the
/// logger; the registry never keeps a half-built instance around.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The directory that should contain the log file could not be created.
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A named logger's file would be indistinguishable from a rotated
    /// backup (`<file>.<index>[.gz]`).
    #[error("log file {path} is shaped like a rotated backup; pick another logger name or base path")]
    BackupCollision { path: PathBuf },

    /// The rotation policy for a log file could not be built.
    #[error("failed to configure rotation for {path}: {source}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One or more sinks failed to flush buffered records.
    #[error("failed to flush log sinks: {0}")]
    Flush(#[source] io::Error),

    /// A global `tracing` subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

pub type Result<T> = std::result::Result<T, Error>;
