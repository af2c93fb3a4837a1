//! Dry-run unified diff support for `multicommit diff`.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use multicommit_core::{mapper::RelativeTarget, ProjectName, ProjectRecord};

use crate::error::BatchError;

/// What copying the update file would do to one project's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewKind {
    /// The project has no target file; copy would fail.
    Missing,
    /// Byte-for-byte equal; copying changes nothing.
    Identical,
    /// Only CRLF versus LF differs. Copying still changes the file.
    LineEndings,
    /// Either side is not UTF-8 text.
    Binary,
    /// The target exists but could not be read.
    Unreadable(String),
    Diff(String),
}

/// One project's preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub project: ProjectName,
    pub target: PathBuf,
    pub kind: PreviewKind,
}

/// Compare `update_file` with the target in every project. No files are
/// written.
pub fn preview(
    records: &[ProjectRecord],
    relative: &RelativeTarget,
    update_file: &Path,
) -> Result<Vec<FilePreview>, BatchError> {
    let update = std::fs::read(update_file).map_err(|source| BatchError::Io {
        path: update_file.to_path_buf(),
        source,
    })?;

    let header_path = relative
        .path()
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(records
        .iter()
        .map(|record| {
            let target = relative.join_onto(record.path());
            let kind = preview_one(&target, &update, &header_path);
            FilePreview {
                project: record.name().clone(),
                target,
                kind,
            }
        })
        .collect())
}

fn preview_one(target: &Path, update: &[u8], header_path: &str) -> PreviewKind {
    if !target.exists() {
        return PreviewKind::Missing;
    }
    let existing = match std::fs::read(target) {
        Ok(bytes) => bytes,
        Err(err) => return PreviewKind::Unreadable(err.to_string()),
    };
    if existing == update {
        return PreviewKind::Identical;
    }
    let (Ok(old), Ok(new)) = (std::str::from_utf8(&existing), std::str::from_utf8(update)) else {
        return PreviewKind::Binary;
    };

    let old = normalize_line_endings(old);
    let new = normalize_line_endings(new);
    if old == new {
        return PreviewKind::LineEndings;
    }
    let old_header = format!("a/{header_path}");
    let new_header = format!("b/{header_path}");
    let unified = TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    PreviewKind::Diff(unified)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use multicommit_core::{mapper, BranchLabel};
    use tempfile::TempDir;

    use super::*;

    fn setup(root: &Path) -> (Vec<ProjectRecord>, RelativeTarget, PathBuf) {
        for (name, content) in [("a", Some("v: 1\nname: a\n")), ("b", Some("v: 2\nname: a\n")), ("c", None)] {
            let dir = root.join(name).join("config");
            fs::create_dir_all(&dir).unwrap();
            if let Some(content) = content {
                fs::write(dir.join("app.yaml"), content).unwrap();
            }
        }
        let update = root.join("update.yaml");
        fs::write(&update, "v: 2\nname: a\n").unwrap();
        let records: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| ProjectRecord::new(ProjectName::from(*n), root.join(n), BranchLabel::NotARepository))
            .collect();
        let relative =
            mapper::resolve_for_records(&records, &root.join("a/config/app.yaml")).unwrap();
        (records, relative, update)
    }

    #[test]
    fn previews_every_project_without_writing() {
        let root = TempDir::new().unwrap();
        let (records, relative, update) = setup(root.path());

        let previews = preview(&records, &relative, &update).unwrap();
        assert_eq!(previews.len(), 3);

        let PreviewKind::Diff(diff) = &previews[0].kind else {
            panic!("expected a diff, got {:?}", previews[0].kind);
        };
        assert!(diff.contains("--- a/config/app.yaml"));
        assert!(diff.contains("+++ b/config/app.yaml"));
        assert!(diff.contains("-v: 1"));
        assert!(diff.contains("+v: 2"));
        assert_eq!(previews[1].kind, PreviewKind::Identical);
        assert_eq!(previews[2].kind, PreviewKind::Missing);

        assert_eq!(
            fs::read_to_string(root.path().join("a/config/app.yaml")).unwrap(),
            "v: 1\nname: a\n"
        );
        assert!(!root.path().join("c/config/app.yaml").exists());
    }

    #[test]
    fn non_utf8_content_is_binary() {
        let root = TempDir::new().unwrap();
        let (records, relative, update) = setup(root.path());
        fs::write(root.path().join("a/config/app.yaml"), [0xff, 0xfe, 0x00]).unwrap();

        let previews = preview(&records, &relative, &update).unwrap();
        assert_eq!(previews[0].kind, PreviewKind::Binary);
    }

    #[test]
    fn missing_update_file_is_an_error() {
        let root = TempDir::new().unwrap();
        let (records, relative, _) = setup(root.path());
        let err = preview(&records, &relative, &root.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, BatchError::Io { .. }));
    }

    #[test]
    fn line_ending_change_is_not_identical() {
        let root = TempDir::new().unwrap();
        let (mut records, relative, update) = setup(root.path());
        fs::write(root.path().join("a/config/app.yaml"), "v: 2\r\nname: a\r\n").unwrap();

        let previews = preview(&records, &relative, &update).unwrap();
        assert_eq!(previews[0].kind, PreviewKind::LineEndings);

        crate::copy::run_copy(&mut records, &relative, &update);
        assert!(records[0].copy_changed(), "copy rewrites the line endings");
    }
}
