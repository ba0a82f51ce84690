//! Value types shared between the [`GitRepo`](crate::GitRepo) trait and its
//! callers.
//!
//! None of these types mention gix; the backend is an implementation detail.

use std::fmt;
use std::str::FromStr;

use crate::error::GitError;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// A git object identifier (SHA-1, 20 bytes).
///
/// Displays as 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid([u8; 20]);

impl GitOid {
    /// The zero OID (`0000...0000`).
    pub const ZERO: Self = Self([0; 20]);

    /// Create a `GitOid` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The first 8 hex characters, as printed in log lines.
    #[must_use]
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(8);
        s
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

impl FromStr for GitOid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(OidParseError {
                value: s.to_owned(),
                reason: format!("expected 40 hex characters, got {}", s.len()),
            });
        }
        let mut bytes = [0u8; 20];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            let digit = |b: u8| {
                char::from(b)
                    .to_digit(16)
                    .and_then(|d| u8::try_from(d).ok())
                    .ok_or_else(|| OidParseError {
                        value: s.to_owned(),
                        reason: format!("invalid hex digit '{}'", char::from(b)),
                    })
            };
            bytes[i] = (digit(pair[0])? << 4) | digit(pair[1])?;
        }
        Ok(Self(bytes))
    }
}

/// Error from parsing a hex string into a [`GitOid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OidParseError {
    /// The raw value that failed.
    pub value: String,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for OidParseError {}

// ---------------------------------------------------------------------------
// RefName
// ---------------------------------------------------------------------------

/// A validated git ref name.
///
/// Must start with `refs/` or be one of the well-known bare names (`HEAD`,
/// `FETCH_HEAD`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefName(String);

const BARE_REFS: &[&str] = &["HEAD", "FETCH_HEAD", "ORIG_HEAD"];

impl RefName {
    /// Create a new `RefName`, validating that it looks like a git ref.
    ///
    /// # Errors
    /// Returns an error if the name is empty, doesn't start with `refs/`,
    /// and isn't a well-known bare ref.
    pub fn new(name: &str) -> Result<Self, RefNameError> {
        if name.is_empty() {
            return Err(RefNameError::new(name, "ref name must not be empty"));
        }
        if name.starts_with("refs/") || BARE_REFS.contains(&name) {
            Ok(Self(name.to_owned()))
        } else {
            Err(RefNameError::new(
                name,
                "ref name must start with 'refs/' or be a well-known ref (HEAD, etc.)",
            ))
        }
    }

    /// `refs/heads/<branch>`.
    ///
    /// # Errors
    /// Returns an error if `branch` is not a usable ref component.
    pub fn local_branch(branch: &str) -> Result<Self, RefNameError> {
        validate_component(branch)?;
        Ok(Self(format!("refs/heads/{branch}")))
    }

    /// `refs/remotes/<remote>/<branch>`, the remote-tracking ref.
    ///
    /// # Errors
    /// Returns an error if either part is not a usable ref component.
    pub fn remote_branch(remote: &str, branch: &str) -> Result<Self, RefNameError> {
        validate_component(remote)?;
        validate_component(branch)?;
        Ok(Self(format!("refs/remotes/{remote}/{branch}")))
    }

    /// Return the ref name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_component(part: &str) -> Result<(), RefNameError> {
    if part.is_empty() {
        return Err(RefNameError::new(part, "ref component must not be empty"));
    }
    if part.contains("..") || part.chars().any(char::is_whitespace) {
        return Err(RefNameError::new(
            part,
            "ref component must not contain whitespace or '..'",
        ));
    }
    Ok(())
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RefName {
    type Err = RefNameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Error from validating a [`RefName`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefNameError {
    /// The invalid value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl RefNameError {
    fn new(value: &str, reason: &str) -> Self {
        Self {
            value: value.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for RefNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ref name {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for RefNameError {}

impl From<RefNameError> for GitError {
    fn from(e: RefNameError) -> Self {
        Self::BackendError {
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity and credentials
// ---------------------------------------------------------------------------

/// Author identity recorded on commits. The timestamp is taken when the
/// commit is written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    /// Display name (e.g. `"Alice"`).
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Signature {
    /// Create a signature from a name and email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// An SSH keypair used for every network operation.
///
/// Host keys are never verified when this credential is in use.
#[derive(Clone, PartialEq, Eq)]
pub struct SshKey {
    user: String,
    private_key: Vec<u8>,
    passphrase: String,
}

impl SshKey {
    /// Build a credential from a PEM or OpenSSH-format private key.
    ///
    /// # Errors
    /// Returns [`GitError::InvalidCredential`] if the user is empty or the key
    /// bytes are not a private key.
    pub fn new(
        user: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
        passphrase: impl Into<String>,
    ) -> Result<Self, GitError> {
        let user = user.into();
        let private_key = private_key.into();
        if user.is_empty() {
            return Err(GitError::InvalidCredential {
                reason: "ssh user must not be empty".to_owned(),
            });
        }
        let text = String::from_utf8_lossy(&private_key);
        if !(text.contains("-----BEGIN") && text.contains("PRIVATE KEY-----")) {
            return Err(GitError::InvalidCredential {
                reason: "key is not a PEM or OpenSSH private key".to_owned(),
            });
        }
        Ok(Self {
            user,
            private_key,
            passphrase: passphrase.into(),
        })
    }

    /// The SSH login user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The raw private key bytes.
    #[must_use]
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// The key passphrase; empty when the key is unencrypted.
    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshKey")
            .field("user", &self.user)
            .field("private_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Transport outcomes
// ---------------------------------------------------------------------------

/// Result of a successful fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// At least one remote-tracking ref moved.
    Updated,
    /// Nothing new on the remote.
    UpToDate,
    /// The remote has no refs at all.
    EmptyRemote,
}

/// Result of a successful push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// The remote branch moved.
    Pushed,
    /// The remote already had every local commit.
    UpToDate,
}

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

/// The file mode of an index or tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Regular file (`100644`).
    Blob,
    /// Executable file (`100755`).
    BlobExecutable,
    /// Symbolic link (`120000`).
    Link,
    /// Gitlink / submodule (`160000`).
    Commit,
}

/// A single entry in the git index (staging area).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    /// The file mode.
    pub mode: EntryMode,
    /// OID of the blob in the index.
    pub oid: GitOid,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
