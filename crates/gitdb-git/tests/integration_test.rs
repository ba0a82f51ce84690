use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use gitdb_git::{
    FetchOutcome, GitBackend, GitError, GitRepo, GixBackend, GixRepo, PushOutcome, RefName,
    Signature,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

fn bare_remote() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--bare", "--quiet"]);
    git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
    dir
}

fn url(remote: &TempDir) -> &str {
    remote.path().to_str().unwrap()
}

fn author() -> Signature {
    Signature::new("Test User", "test@test.com")
}

/// Fresh repository on `master` with `origin` pointing at `remote`.
fn init_with_remote(remote: &TempDir) -> (TempDir, GixRepo) {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    repo.add_remote("origin", url(remote)).unwrap();
    (dir, repo)
}

fn commit_file(dir: &Path, repo: &GixRepo, name: &str, content: &str) -> gitdb_git::GitOid {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    repo.add_path(name).unwrap();
    repo.commit(&format!("write {name}"), &author()).unwrap()
}

// ===========================================================================
// Bootstrap
// ===========================================================================

#[test]
fn init_points_head_at_requested_branch() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "trunk").unwrap();
    assert_eq!(repo.head().unwrap(), None);
    assert_eq!(git(dir.path(), &["symbolic-ref", "HEAD"]), "refs/heads/trunk");
}

#[test]
fn init_twice_reports_already_exists() {
    let dir = TempDir::new().unwrap();
    GixBackend.init_repo(dir.path(), "master").unwrap();
    let err = GixBackend.init_repo(dir.path(), "master").err().unwrap();
    assert!(matches!(err, GitError::AlreadyExists { .. }));
    assert!(GixBackend.open_repo(dir.path()).is_ok());
}

#[test]
fn open_missing_repo_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = GixBackend.open_repo(dir.path()).err().unwrap();
    assert!(matches!(err, GitError::NotFound { .. }));
}

#[test]
fn clone_of_empty_remote_reports_empty_remote() {
    let remote = bare_remote();
    let dir = TempDir::new().unwrap();
    let err = GixBackend
        .clone_repo(url(&remote), &dir.path().join("clone"), None)
        .err()
        .unwrap();
    assert!(matches!(err, GitError::EmptyRemote { .. }));
}

#[test]
fn clone_over_existing_repo_reports_already_exists() {
    let remote = bare_remote();
    let (dir, _repo) = init_with_remote(&remote);
    let err = GixBackend
        .clone_repo(url(&remote), dir.path(), None)
        .err()
        .unwrap();
    assert!(matches!(err, GitError::AlreadyExists { .. }));
}

#[test]
fn sha256_repository_is_rejected_on_open() {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--quiet", "--object-format=sha256"]);
    let err = GixBackend.open_repo(dir.path()).err().unwrap();
    assert!(matches!(err, GitError::BackendError { .. }), "{err}");
}

// ===========================================================================
// Index and commits
// ===========================================================================

#[test]
fn staged_file_makes_index_dirty_until_committed() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    assert!(repo.is_clean().unwrap());

    std::fs::write(dir.path().join("a.json"), "{}").unwrap();
    assert!(repo.is_clean().unwrap(), "unstaged files do not count");

    repo.add_path("a.json").unwrap();
    assert!(!repo.is_clean().unwrap());

    let oid = repo.commit("first", &author()).unwrap();
    assert!(repo.is_clean().unwrap());
    assert_eq!(repo.head().unwrap(), Some(oid));
    assert_eq!(git(dir.path(), &["log", "-1", "--format=%an <%ae> %s"]), "Test User <test@test.com> first");
    assert_eq!(git(dir.path(), &["show", "HEAD:a.json"]), "{}");
}

#[test]
fn nested_paths_and_directories_are_staged() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    std::fs::create_dir_all(dir.path().join("data/users")).unwrap();
    std::fs::write(dir.path().join("data/users/1.json"), "{\"id\":1}").unwrap();
    std::fs::write(dir.path().join("data/index.json"), "[]").unwrap();

    repo.add_path("data").unwrap();
    repo.commit("tree", &author()).unwrap();

    let files = git(dir.path(), &["ls-tree", "-r", "--name-only", "HEAD"]);
    assert_eq!(files, "data/index.json\ndata/users/1.json");
    assert_eq!(git(dir.path(), &["status", "--porcelain"]), "");
}

#[test]
fn adding_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let err = repo.add_path("nope.json").err().unwrap();
    assert!(matches!(err, GitError::NotFound { .. }));
}

#[test]
fn adding_deleted_tracked_file_stages_removal() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    commit_file(dir.path(), &repo, "gone.json", "1");
    commit_file(dir.path(), &repo, "kept.json", "2");

    std::fs::remove_file(dir.path().join("gone.json")).unwrap();
    repo.add_path("gone.json").unwrap();
    assert!(!repo.is_clean().unwrap());
    repo.commit("remove", &author()).unwrap();

    assert_eq!(git(dir.path(), &["ls-tree", "--name-only", "HEAD"]), "kept.json");
}

#[test]
fn walk_ancestors_is_child_first_and_stops_early() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let c1 = commit_file(dir.path(), &repo, "x", "1");
    let c2 = commit_file(dir.path(), &repo, "x", "2");
    let c3 = commit_file(dir.path(), &repo, "x", "3");

    assert_eq!(repo.walk_ancestors(c3, None).unwrap(), vec![c3, c2, c1]);
    assert_eq!(repo.walk_ancestors(c3, Some(c2)).unwrap(), vec![c3]);
    assert!(repo.walk_ancestors(c3, Some(c3)).unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn unrepresentable_index_entry_fails_instead_of_being_dropped() {
    use std::os::unix::ffi::OsStrExt as _;

    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let odd = std::ffi::OsStr::from_bytes(b"odd\xff.json");
    std::fs::write(dir.path().join(odd), "x").unwrap();
    git(dir.path(), &["add", "--all"]);
    std::fs::write(dir.path().join("a.json"), "a").unwrap();

    let err = repo.add_path("a.json").unwrap_err();
    assert!(matches!(err, GitError::BackendError { .. }), "{err}");
    // The index git wrote is left as it was.
    let tracked = git(dir.path(), &["ls-files", "-z"]);
    assert!(tracked.starts_with("odd"), "{tracked:?}");
    assert!(!tracked.contains("a.json"));
}

// ===========================================================================
// Transport
// ===========================================================================

#[test]
fn push_then_fetch_from_second_clone() {
    let remote = bare_remote();
    let (dir, repo) = init_with_remote(&remote);

    assert_eq!(
        repo.fetch("origin", None, true).unwrap(),
        FetchOutcome::EmptyRemote
    );

    let first = commit_file(dir.path(), &repo, "x.json", "{\"v\":1}");
    assert_eq!(repo.push("origin", "master", None).unwrap(), PushOutcome::Pushed);
    assert_eq!(repo.push("origin", "master", None).unwrap(), PushOutcome::UpToDate);

    let tracking = RefName::remote_branch("origin", "master").unwrap();
    assert_eq!(repo.read_ref(&tracking).unwrap(), Some(first));

    let other = TempDir::new().unwrap();
    let clone_path = other.path().join("clone");
    let clone = GixBackend.clone_repo(url(&remote), &clone_path, None).unwrap();
    assert_eq!(clone.head().unwrap(), Some(first));
    assert_eq!(
        clone.fetch("origin", None, true).unwrap(),
        FetchOutcome::UpToDate
    );

    let second = commit_file(dir.path(), &repo, "x.json", "{\"v\":2}");
    repo.push("origin", "master", None).unwrap();
    assert_eq!(
        clone.fetch("origin", None, true).unwrap(),
        FetchOutcome::Updated
    );
    assert_eq!(clone.read_ref(&tracking).unwrap(), Some(second));
}

#[test]
fn hard_reset_discards_local_state_but_keeps_untracked_files() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let base = commit_file(dir.path(), &repo, "a.json", "base");
    commit_file(dir.path(), &repo, "sub/b.json", "later");

    std::fs::write(dir.path().join("a.json"), "local edit").unwrap();
    std::fs::write(dir.path().join("untracked.txt"), "mine").unwrap();

    repo.hard_reset(base).unwrap();

    assert_eq!(repo.head().unwrap(), Some(base));
    assert_eq!(std::fs::read_to_string(dir.path().join("a.json")).unwrap(), "base");
    assert!(!dir.path().join("sub/b.json").exists());
    assert!(!dir.path().join("sub").exists());
    assert!(dir.path().join("untracked.txt").exists());
    assert!(repo.is_clean().unwrap());
}

#[test]
fn checkout_of_missing_branch_is_not_found() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let err = repo.checkout_branch("feature", true).err().unwrap();
    assert!(matches!(err, GitError::NotFound { .. }));
}

#[test]
fn forced_checkout_switches_branch_and_tree() {
    let dir = TempDir::new().unwrap();
    let repo = GixBackend.init_repo(dir.path(), "master").unwrap();
    let base = commit_file(dir.path(), &repo, "a.json", "base");
    repo.write_ref(&RefName::local_branch("other").unwrap(), base, "branch")
        .unwrap();
    commit_file(dir.path(), &repo, "a.json", "master only");

    repo.checkout_branch("other", true).unwrap();

    assert_eq!(git(dir.path(), &["symbolic-ref", "HEAD"]), "refs/heads/other");
    assert_eq!(std::fs::read_to_string(dir.path().join("a.json")).unwrap(), "base");
}
