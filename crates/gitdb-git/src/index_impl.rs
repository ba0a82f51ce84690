//! Index (staging area) operations for [`GixRepo`].

use std::fs;
use std::path::Path;

use gix::bstr::ByteSlice;

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::{EntryMode, IndexEntry};

/// Read the on-disk index, or nothing if it was never written.
///
/// The file is decoded fresh on every call so back-to-back writes are never
/// hidden behind a cached snapshot.
pub fn read_index(repo: &GixRepo) -> Result<Vec<IndexEntry>, GitError> {
    if !repo.repo.index_path().exists() {
        return Ok(Vec::new());
    }
    let index = repo
        .repo
        .open_index()
        .map_err(|e| GitError::backend("failed to open index", e))?;

    // Every entry must survive a round trip through `write_index`.
    let mut entries = Vec::with_capacity(index.entries().len());
    for entry in index.entries() {
        let raw = entry.path(&index);
        let path = raw
            .to_str()
            .map_err(|_| GitError::BackendError {
                message: format!("index entry {raw:?} is not a UTF-8 path"),
            })?
            .to_owned();
        let mode = from_gix_mode(entry.mode).ok_or_else(|| GitError::BackendError {
            message: format!("index entry '{path}' has unsupported mode {:?}", entry.mode),
        })?;
        entries.push(IndexEntry {
            path,
            mode,
            oid: from_gix_oid(entry.id.as_ref())?,
        });
    }

    Ok(entries)
}

/// Replace the index with `entries`.
pub fn write_index(repo: &GixRepo, entries: &[IndexEntry]) -> Result<(), GitError> {
    let mut state = gix::index::State::new(repo.repo.object_hash());

    for ie in entries {
        let stat: gix::index::entry::Stat = Default::default();
        state.dangerously_push_entry(
            stat,
            to_gix_oid(ie.oid),
            gix::index::entry::Flags::empty(),
            to_gix_mode(ie.mode),
            ie.path.as_str().into(),
        );
    }
    state.sort_entries();

    let mut index_file = gix::index::File::from_state(state, repo.repo.index_path());
    index_file
        .write(Default::default())
        .map_err(|e| GitError::backend("failed to write index", e))?;
    Ok(())
}

pub fn add_path(repo: &GixRepo, path: &str) -> Result<(), GitError> {
    let rel = normalize(path);
    let abs = repo.workdir.join(&rel);
    let mut entries = read_index(repo)?;

    let under = |entry: &IndexEntry| {
        rel.is_empty() || entry.path == rel || entry.path.starts_with(&format!("{rel}/"))
    };

    match fs::symlink_metadata(&abs) {
        Ok(meta) if meta.is_dir() => {
            // Drop tracked files under the directory that no longer exist.
            entries.retain(|e| !under(e) || repo.workdir.join(&e.path).exists());
            let mut files = Vec::new();
            collect_files(&repo.workdir, &abs, &mut files)?;
            for file in files {
                stage_file(repo, &mut entries, &file)?;
            }
        }
        Ok(_) => stage_file(repo, &mut entries, &rel)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let before = entries.len();
            entries.retain(|e| !under(e));
            if entries.len() == before {
                return Err(GitError::NotFound {
                    message: format!("pathspec '{rel}' did not match any files"),
                });
            }
        }
        Err(e) => return Err(e.into()),
    }

    write_index(repo, &entries)
}

/// Hash one working-tree file into a blob and upsert its index entry.
fn stage_file(repo: &GixRepo, entries: &mut Vec<IndexEntry>, rel: &str) -> Result<(), GitError> {
    let abs = repo.workdir.join(rel);
    let meta = fs::symlink_metadata(&abs)?;
    let (data, mode) = if meta.file_type().is_symlink() {
        let target = fs::read_link(&abs)?;
        (target.to_string_lossy().into_owned().into_bytes(), EntryMode::Link)
    } else {
        (fs::read(&abs)?, file_mode(&meta))
    };

    let id = repo
        .repo
        .write_blob(&data)
        .map_err(|e| GitError::backend(&format!("failed to hash '{rel}'"), e))?;
    let entry = IndexEntry {
        path: rel.to_owned(),
        mode,
        oid: from_gix_oid(id.as_ref())?,
    };

    match entries.iter_mut().find(|e| e.path == rel) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), GitError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let rel = rel.to_str().ok_or_else(|| GitError::BackendError {
                message: format!("{} is not a UTF-8 path", rel.display()),
            })?;
            out.push(rel.replace('\\', "/"));
        }
    }
    Ok(())
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path == "." {
        return String::new();
    }
    path.trim_start_matches("./").trim_end_matches('/').to_owned()
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> EntryMode {
    use std::os::unix::fs::PermissionsExt as _;
    if meta.permissions().mode() & 0o111 == 0 {
        EntryMode::Blob
    } else {
        EntryMode::BlobExecutable
    }
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> EntryMode {
    EntryMode::Blob
}

fn from_gix_mode(mode: gix::index::entry::Mode) -> Option<EntryMode> {
    Some(match mode {
        gix::index::entry::Mode::FILE => EntryMode::Blob,
        gix::index::entry::Mode::FILE_EXECUTABLE => EntryMode::BlobExecutable,
        gix::index::entry::Mode::SYMLINK => EntryMode::Link,
        gix::index::entry::Mode::COMMIT => EntryMode::Commit,
        _ => return None,
    })
}

fn to_gix_mode(mode: EntryMode) -> gix::index::entry::Mode {
    match mode {
        EntryMode::Blob => gix::index::entry::Mode::FILE,
        EntryMode::BlobExecutable => gix::index::entry::Mode::FILE_EXECUTABLE,
        EntryMode::Link => gix::index::entry::Mode::SYMLINK,
        EntryMode::Commit => gix::index::entry::Mode::COMMIT,
    }
}
