//! gitdb: a schema-less JSON document store kept in a git working tree.
//!
//! Documents are plain files under a local checkout of one branch of a
//! remote repository. [`Db`] owns that checkout's lifecycle (bootstrap,
//! converge to the remote, stage, commit, push); [`Object`] and
//! [`Collection`] read and write single documents through the [`codec`].
//!
//! ```no_run
//! use gitdb::Db;
//! use serde_json::json;
//!
//! # fn main() -> gitdb::Result<()> {
//! let mut db = Db::new("git@example.com:team/data.git", "/var/lib/gitdb/data");
//! db.set_user("gitdb", "gitdb@example.com");
//! db.init()?;
//! db.force_update()?;
//!
//! db.object("settings.json").write(&json!({"theme": "dark"}))?;
//! db.add(&["settings.json"])?;
//! db.commit(Some("update settings"))?;
//! db.push()?;
//! # Ok(())
//! # }
//! ```
//!
//! Everything is synchronous; network operations block for their full
//! duration. A `Db` is not meant to be shared between threads.

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
#[cfg(feature = "must")]
pub mod must;
pub mod store;
pub mod telemetry;

pub use codec::{Marshal, Step, Transform};
pub use config::DbConfig;
pub use db::Db;
pub use error::{BoxError, Error, Result};
#[cfg(feature = "must")]
pub use must::Must;
pub use store::{Collection, Object};

pub use gitdb_git::{GitError, GitOid};
