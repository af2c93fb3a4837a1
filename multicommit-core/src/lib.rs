//! multicommit core library: domain types, discovery, path mapping, reports.
//!
//! Public API surface:
//! - [`types`]: newtypes and the per-project [`ProjectRecord`] state machine
//! - [`error`]: [`RegistryError`], [`MapError`], [`StateError`], [`VcsError`], [`SettingsError`]
//! - [`registry`]: project discovery under a root directory
//! - [`mapper`]: target file → project-relative path
//! - [`report`]: [`BatchReport`] aggregation
//! - [`vcs`]: the [`VersionControl`] capability trait
//! - [`config`]: settings file and [`BatchContext`]

pub mod config;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod report;
pub mod types;
pub mod vcs;

pub use config::{BatchContext, Settings};
pub use error::{MapError, RegistryError, SettingsError, StateError, VcsError};
pub use mapper::RelativeTarget;
pub use report::{summarize, BatchReport, ReportEntry};
pub use types::{BranchLabel, CommitStatus, CopyStatus, ProjectName, ProjectRecord, RevisionId};
pub use vcs::{BranchState, VersionControl};
