//! Network operations via the git CLI.
//!
//! Clone, fetch, push, and remote inspection run `git` as a subprocess.
//! gix has no high-level push, and keeping every network call on one path
//! means one credential mechanism ([`SshSession`]) serves them all.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::credential::SshSession;
use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::refs_impl::list_refs;
use crate::types::{FetchOutcome, PushOutcome, SshKey};

struct GitOutput {
    stdout: String,
}

/// Run `git <args>` and fail with [`GitError::CommandFailed`] on a non-zero exit.
fn run_git<I, S>(cwd: Option<&Path>, args: I, auth: Option<&SshKey>) -> Result<GitOutput, GitError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let command = std::iter::once("git".to_owned())
        .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = Command::new("git");
    cmd.args(&args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let session = auth.map(SshSession::prepare).transpose()?;
    if let Some(session) = &session {
        session.apply(&mut cmd);
    }

    debug!(%command, "running git");
    let out = cmd.output()?;
    if !out.status.success() {
        return Err(GitError::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
        });
    }
    Ok(GitOutput {
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
    })
}

/// `true` if `remote` (a name, when `cwd` is a repository, or a URL)
/// advertises at least one ref.
pub fn remote_has_refs(
    cwd: Option<&Path>,
    remote: &str,
    auth: Option<&SshKey>,
) -> Result<bool, GitError> {
    let out = run_git(cwd, ["ls-remote", "--", remote], auth)?;
    Ok(!out.stdout.trim().is_empty())
}

pub fn clone(url: &str, path: &Path, auth: Option<&SshKey>) -> Result<(), GitError> {
    info!(url, path = %path.display(), "cloning");
    run_git(
        None,
        [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new("--"),
            OsStr::new(url),
            path.as_os_str(),
        ],
        auth,
    )?;
    Ok(())
}

pub fn add_remote(repo: &GixRepo, name: &str, url: &str) -> Result<(), GitError> {
    run_git(Some(&repo.workdir), ["remote", "add", name, url], None)?;
    Ok(())
}

pub fn fetch(
    repo: &GixRepo,
    remote: &str,
    auth: Option<&SshKey>,
    force: bool,
) -> Result<FetchOutcome, GitError> {
    if !remote_has_refs(Some(&repo.workdir), remote, auth)? {
        return Ok(FetchOutcome::EmptyRemote);
    }

    let prefix = format!("refs/remotes/{remote}/");
    let before = list_refs(repo, &prefix)?;

    let mut args = vec!["fetch", "--quiet"];
    if force {
        args.push("--force");
    }
    args.push(remote);
    run_git(Some(&repo.workdir), args, auth)?;

    let after = list_refs(repo, &prefix)?;
    if before == after {
        Ok(FetchOutcome::UpToDate)
    } else {
        Ok(FetchOutcome::Updated)
    }
}

pub fn push(
    repo: &GixRepo,
    remote: &str,
    branch: &str,
    auth: Option<&SshKey>,
) -> Result<PushOutcome, GitError> {
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    let out = run_git(
        Some(&repo.workdir),
        ["push", "--porcelain", remote, refspec.as_str()],
        auth,
    )
    .map_err(|e| match e {
        GitError::CommandFailed { stderr, .. } => GitError::PushFailed {
            remote: remote.to_owned(),
            message: stderr,
        },
        other => other,
    })?;
    Ok(parse_push_porcelain(&out.stdout))
}

/// `--porcelain` marks each ref line with a flag; `=` means "up to date".
fn parse_push_porcelain(stdout: &str) -> PushOutcome {
    let mut flags = stdout
        .lines()
        .filter(|line| line.contains('\t'))
        .filter_map(|line| line.chars().next());
    if flags.all(|flag| flag == '=') {
        PushOutcome::UpToDate
    } else {
        PushOutcome::Pushed
    }
}
