//! The repository handle and its sync lifecycle.
//!
//! ```text
//! Unbootstrapped --init--> Bootstrapped --force_update--> Synced
//!                                 ^                         |
//!                                 |            add / commit v
//!                                 +------ push ------ Ahead of remote
//! ```
//!
//! `force_update` may be called from any bootstrapped state and always
//! converges the local branch to the remote one, discarding local work.
//! Several backend conditions are normal steady states rather than failures
//! and are absorbed here:
//!
//! | Condition                         | Where          | Treated as            |
//! |-----------------------------------|----------------|-----------------------|
//! | remote has no commits             | init, update   | bootstrap / no-op     |
//! | local repository already exists   | init           | open it               |
//! | nothing fetched or pushed         | update, push   | success               |
//! | nothing staged                    | commit         | success, no commit    |

use std::path::{Component, Path};

use gitdb_git::{
    FetchOutcome, GitBackend, GitError, GitOid, GitRepo, GixBackend, PushOutcome, RefName,
    Signature, SshKey,
};
use tracing::{info, instrument, warn};

use crate::config::{DEFAULT_BRANCH, DEFAULT_REMOTE_NAME, DbConfig};
use crate::error::{Error, Result};
use crate::store::{Collection, Object};

/// Message used by [`Db::commit`] when none is given.
pub const DEFAULT_COMMIT_MESSAGE: &str = "update";

/// A database: a local working tree synchronized with one branch of a
/// remote repository.
pub struct Db<B: GitBackend = GixBackend> {
    backend: B,
    config: DbConfig,
    auth: Option<SshKey>,
}

impl Db {
    /// A database for `remote` checked out at `local`, with default names
    /// and author.
    pub fn new(remote: impl Into<String>, local: impl AsRef<Path>) -> Self {
        Self::with_backend(GixBackend, DbConfig::new(remote, local.as_ref()))
    }

    /// Build a database from a loaded configuration, reading the SSH key
    /// from disk if one is configured.
    ///
    /// # Errors
    /// [`Error::Io`] if the key file cannot be read, [`Error::Git`] if it is
    /// not a private key.
    pub fn from_config(config: DbConfig) -> Result<Self> {
        let auth = match &config.ssh {
            Some(ssh) => {
                let path = ssh.resolved_key_path();
                let pem = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
                Some(SshKey::new(ssh.user.as_str(), pem, ssh.passphrase.as_str())?)
            }
            None => None,
        };
        let mut db = Self::with_backend(GixBackend, config);
        db.auth = auth;
        Ok(db)
    }
}

impl<B: GitBackend> Db<B> {
    pub fn with_backend(backend: B, config: DbConfig) -> Self {
        Self {
            backend,
            config: config.normalized(),
            auth: None,
        }
    }

    // -- configuration --------------------------------------------------------

    pub const fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn remote(&self) -> &str {
        &self.config.remote
    }

    pub fn local(&self) -> &Path {
        &self.config.local
    }

    pub fn remote_name(&self) -> &str {
        &self.config.remote_name
    }

    pub fn branch_name(&self) -> &str {
        &self.config.branch
    }

    /// Authenticate fetch and push with an SSH private key.
    ///
    /// # Errors
    /// [`Error::Git`] wrapping [`GitError::InvalidCredential`] if `pem` is
    /// not a private key.
    pub fn set_ssh_key(
        &mut self,
        user: &str,
        pem: impl Into<Vec<u8>>,
        passphrase: &str,
    ) -> Result<()> {
        self.auth = Some(SshKey::new(user, pem, passphrase)?);
        Ok(())
    }

    pub fn set_user(&mut self, name: impl Into<String>, email: impl Into<String>) {
        self.config.author.name = name.into();
        self.config.author.email = email.into();
    }

    /// Set the remote name; an empty name restores `"origin"`.
    pub fn set_remote_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.config.remote_name = if name.is_empty() {
            DEFAULT_REMOTE_NAME.to_owned()
        } else {
            name
        };
    }

    /// Set the branch name; an empty name restores `"master"`.
    pub fn set_branch_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.config.branch = if name.is_empty() {
            DEFAULT_BRANCH.to_owned()
        } else {
            name
        };
    }

    // -- documents ------------------------------------------------------------

    /// A single-record document at `path` under the local root.
    pub fn object(&self, path: impl AsRef<Path>) -> Object {
        Object::new(self.config.local.join(relative(path.as_ref())))
    }

    /// An array document at `path` under the local root.
    pub fn collection(&self, path: impl AsRef<Path>) -> Collection {
        Collection::new(self.config.local.join(relative(path.as_ref())))
    }

    // -- sync -----------------------------------------------------------------

    fn open(&self) -> Result<B::Repo> {
        Ok(self.backend.open_repo(&self.config.local)?)
    }

    fn tracking_ref(&self) -> Result<RefName> {
        RefName::remote_branch(&self.config.remote_name, &self.config.branch)
            .map_err(|e| Error::Git(e.into()))
    }

    /// Clone the remote into the local path, or bootstrap an empty local
    /// repository when the remote has no commits yet.
    ///
    /// Safe to call repeatedly: an existing local repository is opened and
    /// left as is.
    ///
    /// # Errors
    /// Transport failures and an unusable local path.
    #[instrument(skip_all, fields(remote = %self.config.remote, local = %self.config.local.display()))]
    pub fn init(&self) -> Result<()> {
        info!("initializing");
        let local = &self.config.local;
        match self
            .backend
            .clone_repo(&self.config.remote, local, self.auth.as_ref())
        {
            Ok(repo) => {
                // git names the cloned remote "origin".
                if self.config.remote_name != DEFAULT_REMOTE_NAME {
                    repo.add_remote(&self.config.remote_name, &self.config.remote)?;
                }
                Ok(())
            }
            Err(GitError::EmptyRemote { .. }) => {
                info!("remote is empty, initializing local repository");
                match self.backend.init_repo(local, &self.config.branch) {
                    Ok(repo) => {
                        repo.add_remote(&self.config.remote_name, &self.config.remote)?;
                        Ok(())
                    }
                    Err(GitError::AlreadyExists { .. }) => self.open().map(drop),
                    Err(e) => Err(e.into()),
                }
            }
            Err(GitError::AlreadyExists { .. }) => self.open().map(drop),
            Err(e) => Err(e.into()),
        }
    }

    /// Make the local branch, index and working tree match the remote
    /// branch, discarding local commits and edits to tracked files.
    ///
    /// A remote without commits is a no-op.
    ///
    /// # Errors
    /// Transport failures, or [`GitError::NotFound`] if the remote has
    /// commits but not on the configured branch.
    #[instrument(skip_all, fields(remote = %self.config.remote_name, branch = %self.config.branch))]
    pub fn force_update(&self) -> Result<()> {
        let repo = self.open()?;
        info!("fetching");
        match repo.fetch(&self.config.remote_name, self.auth.as_ref(), true)? {
            FetchOutcome::EmptyRemote => {
                info!("remote is empty, nothing to update");
                return Ok(());
            }
            FetchOutcome::UpToDate => info!("already up to date"),
            FetchOutcome::Updated => {}
        }

        let tracking = self.tracking_ref()?;
        let tip = repo.read_ref(&tracking)?.ok_or_else(|| GitError::NotFound {
            message: format!("remote branch {tracking}"),
        })?;

        let branch = RefName::local_branch(&self.config.branch).map_err(GitError::from)?;
        if repo.read_ref(&branch)?.is_none() {
            warn!("local branch missing, creating it at the remote tip");
            repo.write_ref(&branch, tip, &format!("branch: created from {tracking}"))?;
        }
        repo.checkout_branch(&self.config.branch, true)?;
        repo.hard_reset(tip)?;
        info!(commit = %tip.short(), "updated");
        Ok(())
    }

    /// Stage `paths`, each relative to the local root.
    ///
    /// # Errors
    /// [`Error::InvalidPath`] for absolute paths or paths leaving the root;
    /// [`GitError::NotFound`] for paths that exist neither on disk nor in
    /// the index.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        let repo = self.open()?;
        for path in paths {
            let path = path.as_ref();
            check_relative(path)?;
            repo.add_path(path)?;
        }
        Ok(())
    }

    /// Commit the staged changes as the configured author.
    ///
    /// Returns `None` without committing when nothing is staged. An empty
    /// or absent message becomes `"update"`.
    ///
    /// # Errors
    /// Repository failures.
    #[instrument(skip_all)]
    pub fn commit(&self, message: Option<&str>) -> Result<Option<GitOid>> {
        let repo = self.open()?;
        if repo.is_clean()? {
            info!("nothing to commit");
            return Ok(None);
        }
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE);
        let author = Signature::new(
            self.config.author.name.as_str(),
            self.config.author.email.as_str(),
        );
        let oid = repo
            .commit(message, &author)
            .inspect_err(|e| warn!(error = %e, "error adding commit"))?;
        info!(commit = %oid.short(), "added commit");
        Ok(Some(oid))
    }

    /// Push the local branch to the same branch on the remote.
    ///
    /// # Errors
    /// [`GitError::PushFailed`] if the remote rejects the update.
    #[instrument(skip_all, fields(remote = %self.config.remote_name, branch = %self.config.branch))]
    pub fn push(&self) -> Result<()> {
        let repo = self.open()?;
        match repo.push(
            &self.config.remote_name,
            &self.config.branch,
            self.auth.as_ref(),
        )? {
            PushOutcome::Pushed => info!("pushed"),
            PushOutcome::UpToDate => info!("already up to date"),
        }
        Ok(())
    }

    /// Local commits the remote branch does not have yet, newest first.
    ///
    /// The walk follows `HEAD`'s history and stops at the last fetched or
    /// pushed remote tip. Without a remote tip every commit is unpushed.
    ///
    /// # Errors
    /// Repository failures.
    #[instrument(skip_all)]
    pub fn unpushed_commits(&self) -> Result<Vec<GitOid>> {
        let repo = self.open()?;
        let Some(head) = repo.head()? else {
            return Ok(Vec::new());
        };
        let remote_tip = repo.read_ref(&self.tracking_ref()?)?;
        Ok(repo.walk_ancestors(head, remote_tip)?)
    }
}

/// Treat `path` as relative to the local root even when it starts with `/`.
fn relative(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

fn check_relative(path: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: path.to_owned(),
        reason: reason.to_owned(),
    };
    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(invalid("path must be relative to the local root"));
            }
            Component::ParentDir => return Err(invalid("path escapes the local root")),
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}
