//! Shared helpers for gitdb integration tests.
//!
//! Every test gets its own temp directories and a local bare repository as
//! the remote; nothing touches the network.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use gitdb::Db;
use tempfile::TempDir;

/// A bare remote plus a scratch directory for client checkouts.
pub struct Fixture {
    pub remote: TempDir,
    pub clients: TempDir,
}

impl Fixture {
    /// An empty bare remote whose `HEAD` names `master`.
    pub fn new() -> Self {
        let remote = TempDir::new().expect("failed to create temp dir");
        run_git(remote.path(), &["init", "--bare", "--quiet"]);
        run_git(remote.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
        Self {
            remote,
            clients: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn url(&self) -> &str {
        self.remote.path().to_str().expect("temp path is UTF-8")
    }

    /// Checkout path for the client called `name`.
    pub fn local(&self, name: &str) -> PathBuf {
        self.clients.path().join(name)
    }

    /// A database handle for client `name` with a fixed author.
    pub fn db(&self, name: &str) -> Db {
        let mut db = Db::new(self.url(), self.local(name));
        db.set_user(format!("{name} bot"), format!("{name}@test.com"));
        db
    }

    /// Branches present on the remote.
    pub fn remote_branches(&self) -> String {
        run_git(
            self.remote.path(),
            &["for-each-ref", "--format=%(refname)", "refs/heads"],
        )
    }
}

/// Run git in `dir`, asserting success, and return trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

/// Run the `gitdb` binary in `dir` with logging disabled.
pub fn gitdb_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gitdb"))
        .args(args)
        .current_dir(dir)
        .env("GITDB_LOG_FORMAT", "off")
        .env_remove("GITDB_CONFIG")
        .output()
        .expect("failed to run gitdb")
}

/// Run `gitdb`, asserting success, and return stdout.
pub fn gitdb_ok(dir: &Path, args: &[&str]) -> String {
    let out = gitdb_in(dir, args);
    assert!(
        out.status.success(),
        "gitdb {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}
