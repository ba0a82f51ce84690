//! Error types for gitdb.
//!
//! [`Error`] is returned by every fallible operation on [`Db`](crate::Db),
//! [`Object`](crate::Object) and [`Collection`](crate::Collection). Codec
//! failures are described by [`CodecError`] and wrapped with the file path
//! they occurred on.

use std::path::PathBuf;

use gitdb_git::GitError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;

/// Boxed error returned by custom marshal hooks and transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A repository or transport operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A filesystem operation on a document failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded; the file on disk is unchanged.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A document file exists but could not be decoded.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A caller-supplied path is not a relative path inside the local root.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for filesystem errors whose kind is `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
