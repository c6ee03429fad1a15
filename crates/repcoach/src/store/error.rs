//! Error types for workout storage.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("deserialization error at {path}: {message}")]
    FileDeserialization { path: PathBuf, message: String },

    /// A key that cannot be used as a storage path segment.
    #[error("invalid {kind}: {value:?}")]
    InvalidKey { kind: &'static str, value: String },
}

impl StorageError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn file_deserialization(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_key(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidKey {
            kind,
            value: value.into(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
