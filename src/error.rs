use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vhostconf operations
#[derive(Error, Debug)]
pub enum VhostError {
    /// Root configuration file, or a directly included file, does not exist
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file exists but cannot be read
    #[error("Configuration file is not readable: {path} ({source})")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file includes itself, directly or through other files
    #[error("Circular include detected: {path}")]
    CircularInclude { path: PathBuf },

    /// IO error when reading files or directories
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// `WalkDir` error when traversing include directories
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VhostError {
    /// Maps an IO error raised while reading `path` to the matching config error.
    pub(crate) fn from_read(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::ConfigNotFound { path },
            io::ErrorKind::PermissionDenied => Self::ConfigUnreadable { path, source: err },
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, VhostError>;
