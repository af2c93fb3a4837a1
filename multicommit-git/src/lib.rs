//! # multicommit-git
//!
//! [`GitVcs`] implements the `VersionControl` capability over libgit2.
//!
//! Commits produced by [`GitVcs`] contain exactly one changed path on top of
//! HEAD, whatever else happens to be staged in the working tree.

mod git;

pub use git::GitVcs;
