//! Database configuration (`gitdb.toml`).
//!
//! A [`DbConfig`] carries everything a [`Db`](crate::Db) handle needs: the
//! remote URL, the local checkout path, remote and branch names, the commit
//! author, and an optional SSH identity. Defaults are resolved here once, so
//! the rest of the crate never sees an empty remote or branch name.
//!
//! ```toml
//! remote = "git@example.com:team/data.git"
//! local = "/var/lib/gitdb/data"
//! remote_name = "origin"
//! branch = "master"
//!
//! [author]
//! name = "gitdb"
//! email = "gitdb@localhost"
//!
//! [ssh]
//! user = "git"
//! key_path = "~/.ssh/id_ed25519"
//! passphrase = ""
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Remote name used when none is configured.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Branch used when none is configured.
pub const DEFAULT_BRANCH: &str = "master";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level database configuration.
///
/// Missing fields use defaults; a missing file means all defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    /// URL of the remote repository.
    #[serde(default)]
    pub remote: String,

    /// Path of the local working tree.
    #[serde(default)]
    pub local: PathBuf,

    /// Name the remote is registered under (default: `"origin"`).
    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    /// Branch that is fetched, committed to and pushed (default: `"master"`).
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Commit author.
    #[serde(default)]
    pub author: AuthorConfig,

    /// SSH identity for fetch and push. `None` uses the ambient git setup.
    #[serde(default)]
    pub ssh: Option<SshConfig>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            remote: String::new(),
            local: PathBuf::new(),
            remote_name: default_remote_name(),
            branch: default_branch(),
            author: AuthorConfig::default(),
            ssh: None,
        }
    }
}

impl DbConfig {
    /// Configuration for `remote` checked out at `local`, everything else
    /// defaulted.
    pub fn new(remote: impl Into<String>, local: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
            ..Self::default()
        }
    }

    /// Replace empty remote or branch names with their defaults.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.remote_name.is_empty() {
            self.remote_name = default_remote_name();
        }
        if self.branch.is_empty() {
            self.branch = default_branch();
        }
        self
    }
}

fn default_remote_name() -> String {
    DEFAULT_REMOTE_NAME.to_owned()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

// ---------------------------------------------------------------------------
// AuthorConfig
// ---------------------------------------------------------------------------

/// Identity recorded on commits.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    #[serde(default = "default_author_name")]
    pub name: String,
    #[serde(default = "default_author_email")]
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: default_author_name(),
            email: default_author_email(),
        }
    }
}

fn default_author_name() -> String {
    "gitdb".to_owned()
}

fn default_author_email() -> String {
    "gitdb@localhost".to_owned()
}

// ---------------------------------------------------------------------------
// SshConfig
// ---------------------------------------------------------------------------

/// SSH identity loaded from disk when the database is opened.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshConfig {
    /// Remote login user (default: `"git"`).
    #[serde(default = "default_ssh_user")]
    pub user: String,
    /// Path of the PEM/OpenSSH private key. A leading `~/` expands to `$HOME`.
    pub key_path: PathBuf,
    /// Passphrase of the key; empty when unencrypted.
    #[serde(default)]
    pub passphrase: String,
}

impl SshConfig {
    /// `key_path` with a leading `~/` expanded.
    #[must_use]
    pub fn resolved_key_path(&self) -> PathBuf {
        match (self.key_path.strip_prefix("~"), std::env::var_os("HOME")) {
            (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
            _ => self.key_path.clone(),
        }
    }
}

impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("user", &self.user)
            .field("key_path", &self.key_path)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

fn default_ssh_user() -> String {
    "git".to_owned()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{}: {}", p.display(), self.message),
            None => write!(f, "config error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl DbConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(toml_str)
            .map(Self::normalized)
            .map_err(|e| {
                let mut message = e.message().to_owned();
                if let Some(span) = e.span() {
                    let line = toml_str[..span.start].matches('\n').count() + 1;
                    message = format!("line {line}: {message}");
                }
                ConfigError {
                    path: None,
                    message,
                }
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
