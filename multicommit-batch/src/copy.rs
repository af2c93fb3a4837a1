//! CopyStage: distribute the update file into every project.
//!
//! ## `copy_preserving`: 5-step protocol
//!
//! 1. Check the target exists (a missing target is a per-project failure).
//! 2. SHA-256 both files to learn whether the bytes will change.
//! 3. Copy the source to `<target>.multicommit.tmp` (content + permission bits).
//! 4. Stamp the source's access and modification times onto the `.tmp`.
//! 5. Rename over the target (atomic on POSIX); remove the `.tmp` on failure.

use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use sha2::{Digest, Sha256};

use multicommit_core::{mapper::RelativeTarget, ProjectName, ProjectRecord};

use crate::error::{copy_io_err, CopyError};

// ---------------------------------------------------------------------------
// Copy result
// ---------------------------------------------------------------------------

/// Outcome of a successful copy into one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyResult {
    /// The target's content changed.
    Replaced { path: PathBuf },
    /// Same bytes as before; metadata was still refreshed.
    Identical { path: PathBuf },
}

impl CopyResult {
    pub fn path(&self) -> &Path {
        match self {
            CopyResult::Replaced { path } | CopyResult::Identical { path } => path,
        }
    }
}

/// One project's entry in the CopyStage result list.
#[derive(Debug)]
pub struct CopyOutcome {
    pub project: ProjectName,
    pub target: PathBuf,
    pub result: Result<CopyResult, CopyError>,
}

// ---------------------------------------------------------------------------
// copy_preserving
// ---------------------------------------------------------------------------

/// Replace `target` with a copy of `source`, keeping the source's permission
/// bits and timestamps. `target` must already exist.
pub fn copy_preserving(source: &Path, target: &Path) -> Result<CopyResult, CopyError> {
    if !target.exists() {
        return Err(CopyError::TargetNotFound {
            path: target.to_path_buf(),
        });
    }
    // Write through symlinks instead of replacing the link itself.
    let real_target = if target.is_symlink() {
        std::fs::canonicalize(target).map_err(|e| copy_io_err(target, e))?
    } else {
        target.to_path_buf()
    };
    let tmp = PathBuf::from(format!("{}.multicommit.tmp", real_target.display()));
    let changed = copy_with_tmp(source, &real_target, &tmp)?;

    let path = target.to_path_buf();
    Ok(if changed {
        CopyResult::Replaced { path }
    } else {
        CopyResult::Identical { path }
    })
}

fn copy_with_tmp(source: &Path, target: &Path, tmp: &Path) -> Result<bool, CopyError> {
    // Step 2: compare digests before touching anything.
    let changed = digest(source).map_err(|e| copy_io_err(source, e))?
        != digest(target).map_err(|e| copy_io_err(target, e))?;

    // Step 3: content and permissions.
    std::fs::copy(source, tmp).map_err(|e| copy_io_err(tmp, e))?;

    // Step 4: timestamps.
    let stamped = std::fs::metadata(source).and_then(|meta| {
        filetime::set_file_times(
            tmp,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )
    });
    if let Err(e) = stamped {
        let _ = std::fs::remove_file(tmp);
        return Err(copy_io_err(tmp, e));
    }

    // Step 5: atomic rename to final path.
    if let Err(e) = std::fs::rename(tmp, target) {
        let _ = std::fs::remove_file(tmp);
        return Err(copy_io_err(target, e));
    }
    Ok(changed)
}

fn digest(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// run_copy
// ---------------------------------------------------------------------------

/// Copy `update_file` to `relative` inside every project, included or not.
///
/// Always returns exactly one outcome per record; a failing project only
/// marks its own record.
pub fn run_copy(
    records: &mut [ProjectRecord],
    relative: &RelativeTarget,
    update_file: &Path,
) -> Vec<CopyOutcome> {
    let mut outcomes = Vec::with_capacity(records.len());
    for record in records.iter_mut() {
        record.reset_copy();
        let target = relative.join_onto(record.path());
        let result = copy_preserving(update_file, &target);
        match &result {
            Ok(copied) => {
                let changed = matches!(copied, CopyResult::Replaced { .. });
                record.mark_copied(changed);
                if changed {
                    tracing::info!("[{}] copied: {}", record.name(), target.display());
                } else {
                    tracing::debug!("[{}] identical: {}", record.name(), target.display());
                }
            }
            Err(err) => {
                tracing::warn!("[{}] copy failed: {err}", record.name());
                record.mark_copy_failed(err.to_string());
            }
        }
        outcomes.push(CopyOutcome {
            project: record.name().clone(),
            target,
            result,
        });
    }
    outcomes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
