//! Abort-on-failure wrappers.
//!
//! With the `must` feature, any `Result<T, gitdb::Error>` gains a
//! [`must`](Must::must) method that returns the value or panics with the
//! error. Useful in scripts and tests where a failed sync is fatal anyway.
//!
//! ```no_run
//! use gitdb::{Db, Must};
//!
//! let db = Db::new("git@example.com:team/data.git", "/tmp/data");
//! db.init().must();
//! db.force_update().must();
//! ```

use crate::error::Error;

pub trait Must<T> {
    /// The success value; panics with the error otherwise.
    fn must(self) -> T;
}

impl<T> Must<T> for Result<T, Error> {
    #[track_caller]
    fn must(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("gitdb: {e}"),
        }
    }
}
