use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for mock store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The error type for all mock store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration document {path:?} is not valid JSON: {source}")]
    ConfigCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Permission denied writing {path:?}: {source}")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File {path:?} does not contain valid JSON: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid mock filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("File '{filename}' must hold a JSON object at the top level")]
    NotAnObject { filename: String },

    #[error("Failed to determine home directory for the configuration document")]
    HomeDirectoryNotFound,

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    /// Map a failed write or directory creation, keeping permission problems distinct.
    pub fn from_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            StoreError::PermissionDenied { path, source }
        } else {
            StoreError::Io { path, source }
        }
    }

    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
