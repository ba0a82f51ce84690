//! The gix-backed implementation of [`GitRepo`] and [`GitBackend`].

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::GitError;
use crate::repo::{GitBackend, GitRepo};
use crate::types::{FetchOutcome, GitOid, PushOutcome, RefName, Signature, SshKey};

/// A [`GitRepo`] backed by [gix](https://github.com/GitoxideLabs/gitoxide)
/// for local plumbing and the `git` CLI for transport.
///
/// Construct via [`GixBackend`] or [`GixRepo::open`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    pub(crate) workdir: PathBuf,
}

impl GixRepo {
    /// Open the non-bare repository whose working tree is exactly `path`.
    ///
    /// # Errors
    /// [`GitError::NotFound`] if `path` holds no repository.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        if !path.join(".git").exists() {
            return Err(GitError::NotFound {
                message: format!("no git repository at {}", path.display()),
            });
        }
        let repo = gix::open_opts(path, gix::open::Options::isolated())
            .map_err(|e| GitError::backend("failed to open repository", e))?;
        if repo.object_hash() != gix::hash::Kind::Sha1 {
            return Err(GitError::BackendError {
                message: format!(
                    "{} uses {:?} object ids; only SHA-1 repositories are supported",
                    path.display(),
                    repo.object_hash()
                ),
            });
        }
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::BackendError {
                message: format!("{} is a bare repository", path.display()),
            })?;
        Ok(Self { repo, workdir })
    }
}

/// Builds [`GixRepo`] handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct GixBackend;

fn ensure_vacant(path: &Path) -> Result<(), GitError> {
    if path.join(".git").exists() {
        return Err(GitError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

impl GitBackend for GixBackend {
    type Repo = GixRepo;

    fn clone_repo(
        &self,
        url: &str,
        path: &Path,
        auth: Option<&SshKey>,
    ) -> Result<GixRepo, GitError> {
        ensure_vacant(path)?;
        if !crate::transport_impl::remote_has_refs(None, url, auth)? {
            return Err(GitError::EmptyRemote {
                remote: url.to_owned(),
            });
        }
        crate::transport_impl::clone(url, path, auth)?;
        GixRepo::open(path)
    }

    fn init_repo(&self, path: &Path, branch: &str) -> Result<GixRepo, GitError> {
        ensure_vacant(path)?;
        std::fs::create_dir_all(path)?;
        gix::init(path).map_err(|e| GitError::backend("failed to init repository", e))?;
        let repo = GixRepo::open(path)?;
        crate::refs_impl::set_head_symbolic(&repo, &RefName::local_branch(branch)?)?;
        info!(path = %path.display(), branch, "initialized empty repository");
        Ok(repo)
    }

    fn open_repo(&self, path: &Path) -> Result<GixRepo, GitError> {
        GixRepo::open(path)
    }
}

impl GitRepo for GixRepo {
    // === Transport ===
    fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        crate::transport_impl::add_remote(self, name, url)
    }

    fn fetch(
        &self,
        remote: &str,
        auth: Option<&SshKey>,
        force: bool,
    ) -> Result<FetchOutcome, GitError> {
        crate::transport_impl::fetch(self, remote, auth, force)
    }

    fn push(
        &self,
        remote: &str,
        branch: &str,
        auth: Option<&SshKey>,
    ) -> Result<PushOutcome, GitError> {
        crate::transport_impl::push(self, remote, branch, auth)
    }

    // === Refs ===
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::read_ref(self, name)
    }

    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError> {
        crate::refs_impl::write_ref(self, name, oid, log_message)
    }

    fn head(&self) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::head(self)
    }

    // === Worktree ===
    fn checkout_branch(&self, branch: &str, force: bool) -> Result<(), GitError> {
        crate::checkout_impl::checkout_branch(self, branch, force)
    }

    fn hard_reset(&self, oid: GitOid) -> Result<(), GitError> {
        crate::checkout_impl::hard_reset(self, oid)
    }

    // === Index ===
    fn add_path(&self, path: &str) -> Result<(), GitError> {
        crate::index_impl::add_path(self, path)
    }

    fn is_clean(&self) -> Result<bool, GitError> {
        crate::objects_impl::is_clean(self)
    }

    fn commit(&self, message: &str, author: &Signature) -> Result<GitOid, GitError> {
        crate::objects_impl::commit(self, message, author)
    }

    // === History ===
    fn walk_ancestors(
        &self,
        from: GitOid,
        stop_at: Option<GitOid>,
    ) -> Result<Vec<GitOid>, GitError> {
        crate::refs_impl::walk_ancestors(self, from, stop_at)
    }
}

/// Convert a `GitOid` to a `gix::ObjectId`.
pub(crate) fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

/// Convert a `gix::ObjectId` (or `&gix::oid`) to a `GitOid`.
///
/// # Errors
/// [`GitError::BackendError`] for ids that are not 20 bytes long.
pub(crate) fn from_gix_oid(oid: &gix::oid) -> Result<GitOid, GitError> {
    let bytes: [u8; 20] = oid.as_bytes().try_into().map_err(|_| GitError::BackendError {
        message: format!("object id {oid} is not a SHA-1 id"),
    })?;
    Ok(GitOid::from_bytes(bytes))
}
