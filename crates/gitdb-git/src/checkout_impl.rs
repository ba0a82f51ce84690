//! gix-backed branch checkout and hard reset.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use gix::bstr::ByteSlice;
use tracing::debug;

use crate::error::GitError;
use crate::gix_repo::{GixRepo, to_gix_oid};
use crate::index_impl::read_index;
use crate::objects_impl::is_clean;
use crate::refs_impl::{head_target, read_ref, set_head_symbolic, write_ref};
use crate::types::{GitOid, RefName};

pub fn checkout_branch(repo: &GixRepo, branch: &str, force: bool) -> Result<(), GitError> {
    let name = RefName::local_branch(branch)?;
    let tip = read_ref(repo, &name)?.ok_or_else(|| GitError::NotFound {
        message: format!("branch '{branch}' does not exist"),
    })?;

    if !force && !is_clean(repo)? {
        return Err(GitError::BackendError {
            message: format!("staged changes would be overwritten by checkout of '{branch}'"),
        });
    }

    set_head_symbolic(repo, &name)?;
    materialize(repo, tip)
}

pub fn hard_reset(repo: &GixRepo, oid: GitOid) -> Result<(), GitError> {
    materialize(repo, oid)?;
    let target = head_target(repo)?;
    write_ref(repo, &target, oid, &format!("reset: moving to {oid}"))
}

/// Write the tree of commit `oid` into the working tree and the index.
///
/// Files tracked by the previous index but absent from the new tree are
/// deleted; untracked files survive.
fn materialize(repo: &GixRepo, oid: GitOid) -> Result<(), GitError> {
    let previous: HashSet<String> = read_index(repo)?.into_iter().map(|e| e.path).collect();

    let commit = repo
        .repo
        .find_commit(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;
    let tree_oid = commit
        .tree_id()
        .map_err(|e| GitError::backend(&format!("failed to get tree from commit {oid}"), e))?
        .detach();

    let mut index_file = repo
        .repo
        .index_from_tree(&tree_oid)
        .map_err(|e| GitError::backend(&format!("failed to create index from tree {tree_oid}"), e))?;

    let tree_paths: HashSet<String> = index_file
        .entries()
        .iter()
        .filter_map(|entry| entry.path(&index_file).to_str().ok().map(ToOwned::to_owned))
        .collect();

    let mut opts = repo
        .repo
        .checkout_options(gix::worktree::stack::state::attributes::Source::IdMapping)
        .map_err(|e| GitError::backend("failed to get checkout options", e))?;
    opts.overwrite_existing = true;
    opts.destination_is_initially_empty = false;

    let objects = repo
        .repo
        .objects
        .clone()
        .into_arc()
        .map_err(|e| GitError::backend("failed to share object store", e))?;

    let outcome = gix::worktree::state::checkout(
        &mut index_file,
        &repo.workdir,
        objects,
        &gix::progress::Discard,
        &gix::progress::Discard,
        &AtomicBool::new(false),
        opts,
    )
    .map_err(|e| GitError::backend("checkout failed", e))?;

    if let Some(first) = outcome.errors.first() {
        return Err(GitError::BackendError {
            message: format!(
                "checkout had {} error(s), first: {}: {}",
                outcome.errors.len(),
                first.path,
                first.error,
            ),
        });
    }

    index_file
        .write(Default::default())
        .map_err(|e| GitError::backend("failed to write index", e))?;

    let stale: Vec<&String> = previous.difference(&tree_paths).collect();
    debug!(commit = %oid.short(), removed = stale.len(), "materialized tree");
    for rel in stale {
        remove_tracked_file(&repo.workdir, rel)?;
    }
    Ok(())
}

/// Delete a formerly tracked file and any directories it leaves empty.
fn remove_tracked_file(workdir: &Path, rel: &str) -> Result<(), GitError> {
    let path = workdir.join(rel);
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(GitError::BackendError {
                message: format!("failed to remove stale file '{rel}': {e}"),
            });
        }
    }

    let mut dir = path.parent();
    while let Some(d) = dir {
        if d == workdir || std::fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
    Ok(())
}
