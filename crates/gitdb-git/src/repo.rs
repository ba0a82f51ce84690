//! The [`GitRepo`] and [`GitBackend`] traits, the boundary between gitdb's
//! sync engine and git.
//!
//! The engine never touches gix or the git CLI directly; it programs against
//! these traits. [`GixBackend`](crate::GixBackend) is the production
//! implementation, and tests substitute in-memory doubles.
//!
//! | Group      | Methods                                         |
//! |------------|-------------------------------------------------|
//! | Bootstrap  | `clone_repo`, `init_repo`, `open_repo`          |
//! | Transport  | `add_remote`, `fetch`, `push`                   |
//! | Refs       | `read_ref`, `write_ref`, `head`                 |
//! | Worktree   | `checkout_branch`, `hard_reset`                 |
//! | Index      | `add_path`, `is_clean`, `commit`                |
//! | History    | `walk_ancestors`                                |

use std::path::Path;

use crate::error::GitError;
use crate::types::{FetchOutcome, GitOid, PushOutcome, RefName, Signature, SshKey};

/// Constructors for repositories of one backend kind.
pub trait GitBackend {
    /// The repository handle this backend produces.
    type Repo: GitRepo;

    /// Clone `url` into `path`.
    ///
    /// # Errors
    /// - [`GitError::AlreadyExists`] if `path` already holds a repository.
    /// - [`GitError::EmptyRemote`] if the remote has no refs.
    fn clone_repo(&self, url: &str, path: &Path, auth: Option<&SshKey>)
    -> Result<Self::Repo, GitError>;

    /// Create an empty repository at `path` whose `HEAD` names `branch`.
    ///
    /// # Errors
    /// [`GitError::AlreadyExists`] if `path` already holds a repository.
    fn init_repo(&self, path: &Path, branch: &str) -> Result<Self::Repo, GitError>;

    /// Open the repository at exactly `path`.
    ///
    /// # Errors
    /// [`GitError::NotFound`] if there is no repository at `path`.
    fn open_repo(&self, path: &Path) -> Result<Self::Repo, GitError>;
}

/// Operations on one local repository with a working tree.
///
/// Object-safe: callers may hold a `&dyn GitRepo`.
pub trait GitRepo {
    /// Register a remote `name` pointing at `url`.
    fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError>;

    /// Fetch every branch of `remote` into `refs/remotes/<remote>/*`.
    ///
    /// With `force`, remote-tracking refs are overwritten even when the
    /// update is not a fast-forward.
    fn fetch(
        &self,
        remote: &str,
        auth: Option<&SshKey>,
        force: bool,
    ) -> Result<FetchOutcome, GitError>;

    /// Push `refs/heads/<branch>` to the same ref on `remote`.
    fn push(
        &self,
        remote: &str,
        branch: &str,
        auth: Option<&SshKey>,
    ) -> Result<PushOutcome, GitError>;

    /// Resolve a ref to its OID, returning `None` if the ref does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError>;

    /// Create or overwrite a ref unconditionally.
    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError>;

    /// The commit `HEAD` resolves to, or `None` on an unborn branch.
    fn head(&self) -> Result<Option<GitOid>, GitError>;

    /// Point `HEAD` at `refs/heads/<branch>`.
    ///
    /// With `force`, the branch tip is materialized into the working tree and
    /// index, discarding local edits to tracked files.
    ///
    /// Returns [`GitError::NotFound`] if the branch does not exist.
    fn checkout_branch(&self, branch: &str, force: bool) -> Result<(), GitError>;

    /// Make the working tree, index, and current branch match `oid`.
    ///
    /// Tracked files absent from the target tree are removed; untracked files
    /// are left in place.
    fn hard_reset(&self, oid: GitOid) -> Result<(), GitError>;

    /// Stage a path (file or directory) relative to the working-tree root.
    ///
    /// A path that is tracked but gone from disk stages its removal. A path
    /// missing from both disk and index is [`GitError::NotFound`].
    fn add_path(&self, path: &str) -> Result<(), GitError>;

    /// `true` if the index holds nothing that `HEAD` does not.
    fn is_clean(&self) -> Result<bool, GitError>;

    /// Commit the index on top of `HEAD` and advance the current branch.
    fn commit(&self, message: &str, author: &Signature) -> Result<GitOid, GitError>;

    /// Walk history from `from`, children before parents.
    ///
    /// The walk ends as soon as `stop_at` is reached; `stop_at` itself is not
    /// included.
    fn walk_ancestors(&self, from: GitOid, stop_at: Option<GitOid>)
    -> Result<Vec<GitOid>, GitError>;
}
