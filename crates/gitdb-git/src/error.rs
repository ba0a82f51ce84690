//! Error types for git operations.
//!
//! [`GitError`] is the single error type returned by all [`GitRepo`](crate::GitRepo)
//! and [`GitBackend`](crate::GitBackend) methods. Three variants describe
//! expected steady states rather than faults ([`GitError::EmptyRemote`],
//! [`GitError::AlreadyExists`], and the `UpToDate` outcomes reported through
//! [`FetchOutcome`](crate::FetchOutcome) / [`PushOutcome`](crate::PushOutcome));
//! callers match on them to normalize their lifecycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by git backend operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A requested object, ref, or path was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// A repository already exists where one was about to be created.
    #[error("repository already exists at {}", path.display())]
    AlreadyExists {
        /// The local path that already holds a repository.
        path: PathBuf,
    },

    /// The remote is reachable but has no refs (no commits were ever pushed).
    #[error("remote repository `{remote}` is empty")]
    EmptyRemote {
        /// Remote name or URL.
        remote: String,
    },

    /// SSH credential material could not be used.
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// Why the credential was rejected.
        reason: String,
    },

    /// A git subprocess exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The git command line that was run (e.g. `"git fetch origin"`).
        command: String,
        /// Captured stderr from git, trimmed.
        stderr: String,
    },

    /// A push to a remote was rejected or failed.
    #[error("push to `{remote}` failed: {message}")]
    PushFailed {
        /// The remote name (e.g., `"origin"`).
        remote: String,
        /// Details about the failure.
        message: String,
    },

    /// An I/O error occurred (file system, process spawn, etc.).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// gix returned an unclassified error.
    ///
    /// The `message` should include enough context to diagnose the failure.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}

impl GitError {
    pub(crate) fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        Self::BackendError {
            message: format!("{context}: {err}"),
        }
    }
}
