//! In-memory `VersionControl` for stage tests.
//!
//! Each registered directory gets a linear history of snapshots (relative
//! path → bytes). Staging reads the file from disk; a hard reset writes the
//! snapshot back to disk.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use multicommit_core::{BranchState, RevisionId, VcsError, VersionControl};

type Snapshot = BTreeMap<String, Vec<u8>>;

#[derive(Default)]
struct FakeRepo {
    history: Vec<(RevisionId, Snapshot, String)>,
    staged: Snapshot,
    pushed: Vec<RevisionId>,
    dirty: bool,
}

#[derive(Default)]
pub(crate) struct FakeVcs {
    repos: RefCell<HashMap<PathBuf, FakeRepo>>,
    failing_push: RefCell<HashSet<PathBuf>>,
    calls: RefCell<Vec<(PathBuf, &'static str)>>,
    counter: RefCell<usize>,
}

fn key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl FakeVcs {
    /// Register `dir` as a repository whose root commit holds `files`.
    pub(crate) fn add_repo(&self, dir: &Path, files: &[&str]) {
        let snapshot: Snapshot = files
            .iter()
            .map(|f| (f.to_string(), std::fs::read(dir.join(f)).unwrap_or_default()))
            .collect();
        let root = self.next_revision(dir);
        let repo = FakeRepo {
            history: vec![(root, snapshot.clone(), "root".to_string())],
            staged: snapshot,
            ..FakeRepo::default()
        };
        self.repos.borrow_mut().insert(dir.to_path_buf(), repo);
    }

    /// Register `dir` as a repository on an unborn branch.
    pub(crate) fn add_empty_repo(&self, dir: &Path) {
        self.repos
            .borrow_mut()
            .insert(dir.to_path_buf(), FakeRepo::default());
    }

    pub(crate) fn fail_push(&self, dir: &Path) {
        self.failing_push.borrow_mut().insert(dir.to_path_buf());
    }

    pub(crate) fn set_dirty(&self, dir: &Path, dirty: bool) {
        if let Some(repo) = self.repos.borrow_mut().get_mut(dir) {
            repo.dirty = dirty;
        }
    }

    /// Simulate someone committing on top of HEAD outside this tool.
    pub(crate) fn commit_elsewhere(&self, dir: &Path) -> RevisionId {
        let revision = self.next_revision(dir);
        let mut repos = self.repos.borrow_mut();
        let repo = repos.get_mut(dir).expect("registered repo");
        let snapshot = repo.history.last().map(|h| h.1.clone()).unwrap_or_default();
        repo.history
            .push((revision.clone(), snapshot, "elsewhere".to_string()));
        revision
    }

    pub(crate) fn pushed(&self, dir: &Path) -> Vec<RevisionId> {
        self.repos
            .borrow()
            .get(dir)
            .map(|r| r.pushed.clone())
            .unwrap_or_default()
    }

    pub(crate) fn head(&self, dir: &Path) -> Option<RevisionId> {
        self.repos
            .borrow()
            .get(dir)
            .and_then(|r| r.history.last().map(|h| h.0.clone()))
    }

    pub(crate) fn last_message(&self, dir: &Path) -> Option<String> {
        self.repos
            .borrow()
            .get(dir)
            .and_then(|r| r.history.last().map(|h| h.2.clone()))
    }

    pub(crate) fn calls_for(&self, dir: &Path) -> Vec<&'static str> {
        self.calls
            .borrow()
            .iter()
            .filter(|(p, _)| p == dir)
            .map(|(_, op)| *op)
            .collect()
    }

    fn next_revision(&self, dir: &Path) -> RevisionId {
        let mut counter = self.counter.borrow_mut();
        *counter += 1;
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        RevisionId(format!("{name}-{:04}", *counter))
    }

    fn record(&self, dir: &Path, op: &'static str) {
        self.calls.borrow_mut().push((dir.to_path_buf(), op));
    }

    fn with_repo<T>(
        &self,
        dir: &Path,
        f: impl FnOnce(&mut FakeRepo) -> Result<T, VcsError>,
    ) -> Result<T, VcsError> {
        let mut repos = self.repos.borrow_mut();
        let repo = repos.get_mut(dir).ok_or_else(|| VcsError::NotARepository {
            path: dir.to_path_buf(),
        })?;
        f(repo)
    }
}

impl VersionControl for FakeVcs {
    type Handle = PathBuf;

    fn open(&self, path: &Path) -> Result<PathBuf, VcsError> {
        self.record(path, "open");
        self.with_repo(path, |_| Ok(path.to_path_buf()))
    }

    fn current_branch(&self, _handle: &PathBuf) -> Result<BranchState, VcsError> {
        Ok(BranchState::Branch("main".to_string()))
    }

    fn stage(&self, handle: &PathBuf, relative_path: &Path) -> Result<(), VcsError> {
        self.record(handle, "stage");
        let bytes = std::fs::read(handle.join(relative_path))
            .map_err(|e| VcsError::backend("stage", e.to_string()))?;
        self.with_repo(handle, |repo| {
            repo.staged.insert(key(relative_path), bytes);
            Ok(())
        })
    }

    fn has_effective_change(&self, handle: &PathBuf, relative_path: &Path) -> Result<bool, VcsError> {
        self.with_repo(handle, |repo| {
            let head = repo.history.last().and_then(|h| h.1.get(&key(relative_path)));
            Ok(repo.staged.get(&key(relative_path)) != head)
        })
    }

    fn commit(
        &self,
        handle: &PathBuf,
        relative_path: &Path,
        message: &str,
    ) -> Result<RevisionId, VcsError> {
        self.record(handle, "commit");
        let revision = self.next_revision(handle);
        self.with_repo(handle, |repo| {
            let mut snapshot = repo.history.last().map(|h| h.1.clone()).unwrap_or_default();
            let staged = repo
                .staged
                .get(&key(relative_path))
                .cloned()
                .ok_or_else(|| VcsError::backend("commit", "nothing staged"))?;
            snapshot.insert(key(relative_path), staged);
            repo.history
                .push((revision.clone(), snapshot, message.to_string()));
            Ok(revision)
        })
    }

    fn push(&self, handle: &PathBuf) -> Result<(), VcsError> {
        self.record(handle, "push");
        if self.failing_push.borrow().contains(handle) {
            return Err(VcsError::backend("push", "remote rejected"));
        }
        self.with_repo(handle, |repo| {
            if let Some(head) = repo.history.last() {
                repo.pushed.push(head.0.clone());
            }
            Ok(())
        })
    }

    fn head_revision(&self, handle: &PathBuf) -> Result<Option<RevisionId>, VcsError> {
        self.with_repo(handle, |repo| Ok(repo.history.last().map(|h| h.0.clone())))
    }

    fn parent_revision(
        &self,
        handle: &PathBuf,
        revision: &RevisionId,
    ) -> Result<Option<RevisionId>, VcsError> {
        self.with_repo(handle, |repo| {
            let index = repo
                .history
                .iter()
                .position(|h| &h.0 == revision)
                .ok_or_else(|| VcsError::backend("find revision", "unknown revision"))?;
            Ok(index.checked_sub(1).map(|i| repo.history[i].0.clone()))
        })
    }

    fn is_dirty(&self, handle: &PathBuf) -> Result<bool, VcsError> {
        self.with_repo(handle, |repo| Ok(repo.dirty))
    }

    fn hard_reset_to(&self, handle: &PathBuf, revision: &RevisionId) -> Result<(), VcsError> {
        self.record(handle, "reset");
        self.with_repo(handle, |repo| {
            let index = repo
                .history
                .iter()
                .position(|h| &h.0 == revision)
                .ok_or_else(|| VcsError::backend("reset", "unknown revision"))?;
            repo.history.truncate(index + 1);
            let snapshot = repo.history[index].1.clone();
            for (path, bytes) in &snapshot {
                std::fs::write(handle.join(path), bytes)
                    .map_err(|e| VcsError::backend("reset", e.to_string()))?;
            }
            repo.staged = snapshot;
            repo.dirty = false;
            Ok(())
        })
    }
}
