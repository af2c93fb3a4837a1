//! Batch summary, derived on demand from the current records.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{CommitStatus, CopyStatus, ProjectName, ProjectRecord, RevisionId};

/// One project line in a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub project: ProjectName,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<RevisionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of a batch. Sections are in registry order; projects still
/// `pending` for a stage appear in none of that stage's sections.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub copied_ok: Vec<ReportEntry>,
    pub copy_failed: Vec<ReportEntry>,
    pub published_ok: Vec<ReportEntry>,
    pub publish_failed: Vec<ReportEntry>,
    pub publish_skipped: Vec<ReportEntry>,
}

impl BatchReport {
    /// At least one project has a publish outcome.
    pub fn has_publish_entries(&self) -> bool {
        !(self.published_ok.is_empty()
            && self.publish_failed.is_empty()
            && self.publish_skipped.is_empty())
    }

    pub fn has_failures(&self) -> bool {
        !(self.copy_failed.is_empty() && self.publish_failed.is_empty())
    }
}

/// Aggregate `records` into report sections. Pure.
pub fn summarize(records: &[ProjectRecord]) -> BatchReport {
    let mut report = BatchReport {
        generated_at: Utc::now(),
        copied_ok: Vec::new(),
        copy_failed: Vec::new(),
        published_ok: Vec::new(),
        publish_failed: Vec::new(),
        publish_skipped: Vec::new(),
    };

    for record in records {
        let entry = |revision: Option<&RevisionId>, error: Option<&str>| ReportEntry {
            project: record.name().clone(),
            path: record.path().to_path_buf(),
            revision: revision.cloned(),
            error: error.map(str::to_owned),
        };

        match record.copy_status() {
            CopyStatus::Success => report.copied_ok.push(entry(None, None)),
            CopyStatus::Failed => report.copy_failed.push(entry(None, record.copy_error())),
            CopyStatus::Pending => {}
        }
        match record.commit_status() {
            CommitStatus::Success => report
                .published_ok
                .push(entry(record.last_published_revision(), None)),
            CommitStatus::Failed => report
                .publish_failed
                .push(entry(None, record.publish_error())),
            CommitStatus::Skipped => report.publish_skipped.push(entry(None, None)),
            CommitStatus::Pending => {}
        }
    }
    report
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Update report ({}) ===",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        write_section(f, "Copied", &self.copied_ok)?;
        write_section(f, "Copy failed", &self.copy_failed)?;
        if self.has_publish_entries() {
            write_section(f, "Published", &self.published_ok)?;
            write_section(f, "Publish failed", &self.publish_failed)?;
            write_section(f, "Unchanged (no commit)", &self.publish_skipped)?;
        }
        Ok(())
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, entries: &[ReportEntry]) -> fmt::Result {
    writeln!(f, "{title} ({}):", entries.len())?;
    if entries.is_empty() {
        return writeln!(f, "  (none)");
    }
    for e in entries {
        write!(f, "  - {} ({})", e.project, e.path.display())?;
        if let Some(rev) = &e.revision {
            write!(f, " @ {}", rev.short())?;
        }
        if let Some(err) = &e.error {
            write!(f, ": {err}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}
