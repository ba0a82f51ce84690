//! gix-backed tree and commit writing.

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::index_impl::read_index;
use crate::refs_impl::{head, head_target, write_ref};
use crate::types::{EntryMode, GitOid, Signature};

fn to_gix_entry_kind(mode: EntryMode) -> gix::objs::tree::EntryKind {
    match mode {
        EntryMode::Blob => gix::objs::tree::EntryKind::Blob,
        EntryMode::BlobExecutable => gix::objs::tree::EntryKind::BlobExecutable,
        EntryMode::Link => gix::objs::tree::EntryKind::Link,
        EntryMode::Commit => gix::objs::tree::EntryKind::Commit,
    }
}

/// Write the tree described by the index and return its id.
///
/// Intermediate trees for nested paths are created by the tree editor.
pub fn write_index_tree(repo: &GixRepo) -> Result<gix::ObjectId, GitError> {
    let entries = read_index(repo)?;
    let base = repo.repo.empty_tree();
    let mut editor = base
        .edit()
        .map_err(|e| GitError::backend("failed to create tree editor", e))?;

    for entry in &entries {
        editor
            .upsert(
                entry.path.as_str(),
                to_gix_entry_kind(entry.mode),
                to_gix_oid(entry.oid),
            )
            .map_err(|e| GitError::backend(&format!("tree upsert '{}'", entry.path), e))?;
    }

    let id = editor
        .write()
        .map_err(|e| GitError::backend("failed to write index tree", e))?;
    Ok(id.detach())
}

/// The tree of the `HEAD` commit; the empty tree on an unborn branch.
fn head_tree(repo: &GixRepo) -> Result<gix::ObjectId, GitError> {
    let Some(oid) = head(repo)? else {
        return Ok(gix::ObjectId::empty_tree(repo.repo.object_hash()));
    };
    let commit = repo
        .repo
        .find_commit(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;
    let tree = commit
        .tree_id()
        .map_err(|e| GitError::backend(&format!("failed to read tree of {oid}"), e))?;
    Ok(tree.detach())
}

pub fn is_clean(repo: &GixRepo) -> Result<bool, GitError> {
    Ok(write_index_tree(repo)? == head_tree(repo)?)
}

pub fn commit(repo: &GixRepo, message: &str, author: &Signature) -> Result<GitOid, GitError> {
    let tree = write_index_tree(repo)?;
    let parent = head(repo)?;

    let signature = gix::actor::Signature {
        name: author.name.as_str().into(),
        email: author.email.as_str().into(),
        time: gix::date::Time::now_local_or_utc(),
    };
    let commit = gix::objs::Commit {
        message: message.into(),
        tree,
        author: signature.clone(),
        committer: signature,
        encoding: None,
        parents: parent.map(to_gix_oid).into_iter().collect(),
        extra_headers: Default::default(),
    };
    let id = repo
        .repo
        .write_object(&commit)
        .map_err(|e| GitError::backend("failed to write commit object", e))?;
    let oid = from_gix_oid(id.as_ref())?;

    let summary = message.lines().next().unwrap_or_default();
    let branch = head_target(repo)?;
    write_ref(repo, &branch, oid, &format!("commit: {summary}"))?;
    Ok(oid)
}
