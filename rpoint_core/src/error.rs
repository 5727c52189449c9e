//! Error types for rpoint_core.

use crate::point::RestorePointId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using rpoint_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during backup operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred while inspecting the file system.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Backup source does not exist or is not a directory.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Backup source exists but contains no files.
    #[error("Directory is empty: {path}")]
    DirectoryEmpty { path: PathBuf },

    /// An incremental point was added before any full point.
    #[error("First restore point of a backup must be a full point")]
    FirstPointIncremental,

    /// A full point still has incremental points depending on it.
    #[error("Restore point {id} has {dependents} dependent incremental point(s)")]
    RemovingDependent { id: RestorePointId, dependents: usize },

    /// No restore point with the given id is live in the chain.
    #[error("Restore point not found: {id}")]
    RestorePointNotFound { id: RestorePointId },

    /// A restore point with the same id is already in the chain.
    #[error("Restore point already present: {id}")]
    DuplicateRestorePoint { id: RestorePointId },

    /// Adding a size would overflow a byte counter.
    #[error("Size {size} overflows byte total {total}")]
    SizeOverflow { size: u64, total: u64 },

    /// Policy configuration is malformed.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create a DirectoryNotFound error.
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Error::DirectoryNotFound { path: path.into() }
    }

    /// Create a DirectoryEmpty error.
    pub fn directory_empty(path: impl Into<PathBuf>) -> Self {
        Error::DirectoryEmpty { path: path.into() }
    }

    /// Create a RemovingDependent error.
    pub fn removing_dependent(id: RestorePointId, dependents: usize) -> Self {
        Error::RemovingDependent { id, dependents }
    }

    /// Create a RestorePointNotFound error.
    pub fn restore_point_not_found(id: RestorePointId) -> Self {
        Error::RestorePointNotFound { id }
    }

    /// Create a DuplicateRestorePoint error.
    pub fn duplicate_restore_point(id: RestorePointId) -> Self {
        Error::DuplicateRestorePoint { id }
    }

    /// Create a SizeOverflow error.
    pub fn size_overflow(size: u64, total: u64) -> Self {
        Error::SizeOverflow { size, total }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
