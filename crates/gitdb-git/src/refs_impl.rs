//! gix-backed ref, `HEAD`, and history operations.

use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::refs::{FullName, Target};

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::{GitOid, RefName};

pub fn read_ref(repo: &GixRepo, name: &RefName) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r
                .peel_to_id_in_place()
                .map_err(|e| GitError::backend(&format!("failed to peel {name}"), e))?;
            Ok(Some(from_gix_oid(id.as_ref())?))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::backend(&format!("failed to read {name}"), e)),
    }
}

pub fn write_ref(
    repo: &GixRepo,
    name: &RefName,
    oid: GitOid,
    log_message: &str,
) -> Result<(), GitError> {
    repo.repo
        .reference(
            name.as_str(),
            to_gix_oid(oid),
            PreviousValue::Any,
            log_message,
        )
        .map_err(|e| GitError::backend(&format!("failed to write {name}"), e))?;
    Ok(())
}

/// Point `HEAD` at `target` without touching the working tree.
pub fn set_head_symbolic(repo: &GixRepo, target: &RefName) -> Result<(), GitError> {
    let target: FullName = target
        .as_str()
        .try_into()
        .map_err(|e: gix::validate::reference::name::Error| {
            GitError::backend("invalid HEAD target", e)
        })?;
    let head: FullName = "HEAD"
        .try_into()
        .map_err(|e: gix::validate::reference::name::Error| GitError::backend("HEAD", e))?;

    repo.repo
        .edit_reference(RefEdit {
            change: Change::Update {
                log: LogChange {
                    mode: RefLog::AndReference,
                    force_create_reflog: false,
                    message: format!("checkout: moving to {}", target.as_bstr()).into(),
                },
                expected: PreviousValue::Any,
                new: Target::Symbolic(target),
            },
            name: head,
            deref: false,
        })
        .map_err(|e| GitError::backend("failed to update HEAD", e))?;
    Ok(())
}

/// The ref `HEAD` points at, or `HEAD` itself when detached.
pub fn head_target(repo: &GixRepo) -> Result<RefName, GitError> {
    let name = repo
        .repo
        .head_name()
        .map_err(|e| GitError::backend("failed to read HEAD", e))?;
    let name = match name {
        Some(full) => full.as_bstr().to_string(),
        None => "HEAD".to_owned(),
    };
    Ok(RefName::new(&name)?)
}

pub fn head(repo: &GixRepo) -> Result<Option<GitOid>, GitError> {
    let head = repo
        .repo
        .head()
        .map_err(|e| GitError::backend("failed to read HEAD", e))?;
    if head.is_unborn() {
        return Ok(None);
    }
    let id = repo
        .repo
        .head_id()
        .map_err(|e| GitError::backend("failed to resolve HEAD", e))?;
    Ok(Some(from_gix_oid(id.as_ref())?))
}

/// Every ref under `prefix` with its peeled OID, sorted by name.
pub fn list_refs(repo: &GixRepo, prefix: &str) -> Result<Vec<(String, GitOid)>, GitError> {
    let platform = repo
        .repo
        .references()
        .map_err(|e| GitError::backend("failed to list refs", e))?;
    let refs_iter = platform
        .prefixed(prefix)
        .map_err(|e| GitError::backend(&format!("failed to list refs under {prefix}"), e))?;

    let mut result = Vec::new();
    for r in refs_iter {
        let mut r = r.map_err(|e| GitError::backend("failed to read ref", e))?;
        let name = r.name().as_bstr().to_string();
        let id = r
            .peel_to_id_in_place()
            .map_err(|e| GitError::backend(&format!("failed to peel {name}"), e))?;
        result.push((name, from_gix_oid(id.as_ref())?));
    }
    result.sort();
    Ok(result)
}

pub fn walk_ancestors(
    repo: &GixRepo,
    from: GitOid,
    stop_at: Option<GitOid>,
) -> Result<Vec<GitOid>, GitError> {
    let walk = repo
        .repo
        .rev_walk([to_gix_oid(from)])
        .all()
        .map_err(|e| GitError::backend(&format!("failed to walk from {from}"), e))?;

    let mut commits = Vec::new();
    for info in walk {
        let info = info.map_err(|e| GitError::backend("revision walk failed", e))?;
        let oid = from_gix_oid(info.id.as_ref())?;
        if Some(oid) == stop_at {
            break;
        }
        commits.push(oid);
    }
    Ok(commits)
}
