//! Git backend for gitdb.
//!
//! This crate defines the [`GitRepo`] and [`GitBackend`] traits: the single
//! interface through which gitdb's sync engine reaches git. No other gitdb
//! crate imports gix or spawns git directly.
//!
//! # Crate layout
//!
//! - [`repo`]: the trait definitions.
//! - [`types`]: value types used in trait signatures ([`GitOid`], [`RefName`],
//!   [`Signature`], [`SshKey`], ...).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.
//!
//! Local plumbing (refs, index, trees, commits, checkout) is done in-process
//! with gix. Network transport runs the `git` CLI, because gix has no
//! high-level push and a single subprocess path keeps credential handling in
//! one place.

pub mod error;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod checkout_impl;
mod credential;
mod gix_repo;
mod index_impl;
mod objects_impl;
mod refs_impl;
mod transport_impl;

pub use gix_repo::{GixBackend, GixRepo};

pub use error::GitError;
pub use repo::{GitBackend, GitRepo};
pub use types::{
    EntryMode, FetchOutcome, GitOid, IndexEntry, OidParseError, PushOutcome, RefName,
    RefNameError, Signature, SshKey,
};
