use std::ffi::OsStr;
use std::path::{Component, Path};

use git2::{
    build::TreeUpdateBuilder, Commit, Cred, CredentialType, ErrorCode, FileMode, Oid,
    PushOptions, RemoteCallbacks, Repository, RepositoryOpenFlags, ResetType, Signature,
    StatusOptions,
};

use multicommit_core::{BranchState, RevisionId, Settings, VcsError, VersionControl};

/// libgit2-backed version control.
///
/// Carries the remote name and fallback identity from [`Settings`]; it holds
/// no per-repository state, so one value serves a whole batch.
#[derive(Debug, Clone)]
pub struct GitVcs {
    remote: String,
    author_name: String,
    author_email: String,
}

impl GitVcs {
    pub fn new(settings: &Settings) -> Self {
        Self {
            remote: settings.remote.clone(),
            author_name: settings.author_name.clone(),
            author_email: settings.author_email.clone(),
        }
    }

    fn signature(&self, repo: &Repository) -> Result<Signature<'static>, VcsError> {
        match repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Signature::now(&self.author_name, &self.author_email)
                .map_err(git_err("signature")),
        }
    }
}

impl Default for GitVcs {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

fn git_err(operation: &'static str) -> impl Fn(git2::Error) -> VcsError {
    move |err| VcsError::backend(operation, err.message())
}

fn work_flags() -> RepositoryOpenFlags {
    RepositoryOpenFlags::NO_SEARCH | RepositoryOpenFlags::CROSS_FS
}

fn bare_flags() -> RepositoryOpenFlags {
    RepositoryOpenFlags::NO_SEARCH
        | RepositoryOpenFlags::CROSS_FS
        | RepositoryOpenFlags::NO_DOTGIT
        | RepositoryOpenFlags::BARE
}

/// Repository-relative path with `/` separators, as git stores it.
fn git_path(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn file_mode(mode: u32) -> FileMode {
    match mode {
        0o100755 => FileMode::BlobExecutable,
        0o120000 => FileMode::Link,
        _ => FileMode::Blob,
    }
}

fn parse_oid(revision: &RevisionId) -> Result<Oid, VcsError> {
    Oid::from_str(&revision.0).map_err(git_err("parse revision"))
}

/// HEAD commit, or `None` on an unborn branch.
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, VcsError> {
    match repo.head() {
        Ok(head) => head.peel_to_commit().map(Some).map_err(git_err("read HEAD")),
        Err(err) if err.code() == ErrorCode::UnbornBranch => Ok(None),
        Err(err) => Err(git_err("read HEAD")(err)),
    }
}

/// `(blob id, mode)` of `path` in HEAD's tree.
fn head_entry(repo: &Repository, path: &str) -> Result<Option<(Oid, u32)>, VcsError> {
    let Some(commit) = head_commit(repo)? else {
        return Ok(None);
    };
    let tree = commit.tree().map_err(git_err("read HEAD tree"))?;
    match tree.get_path(Path::new(path)) {
        Ok(entry) => Ok(Some((entry.id(), entry.filemode() as u32))),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(git_err("read HEAD tree")(err)),
    }
}

/// Where the next credential comes from. libgit2 calls the credentials
/// callback again after every rejection, so each source is offered once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialSource {
    SshAgent,
    Helper,
    Default,
}

#[derive(Debug, Default)]
struct CredentialAttempts {
    ssh_agent: bool,
    helper: bool,
    default: bool,
}

impl CredentialAttempts {
    fn next(&mut self, allowed: CredentialType, has_username: bool) -> Option<CredentialSource> {
        if allowed.contains(CredentialType::SSH_KEY) && has_username && !self.ssh_agent {
            self.ssh_agent = true;
            return Some(CredentialSource::SshAgent);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) && !self.helper {
            self.helper = true;
            return Some(CredentialSource::Helper);
        }
        if !self.default {
            self.default = true;
            return Some(CredentialSource::Default);
        }
        None
    }
}

impl VersionControl for GitVcs {
    type Handle = Repository;

    fn open(&self, path: &Path) -> Result<Repository, VcsError> {
        let ceiling: [&OsStr; 0] = [];
        let work = Repository::open_ext(path, work_flags(), ceiling);
        let repo = match work {
            Ok(repo) => repo,
            Err(_) => match Repository::open_ext(path, bare_flags(), ceiling) {
                Ok(repo) => repo,
                Err(err) if err.code() == ErrorCode::NotFound => {
                    return Err(VcsError::NotARepository {
                        path: path.to_path_buf(),
                    })
                }
                Err(err) => return Err(git_err("open")(err)),
            },
        };
        Ok(repo)
    }

    fn current_branch(&self, repo: &Repository) -> Result<BranchState, VcsError> {
        if repo.is_bare() {
            return Ok(BranchState::Bare);
        }
        match repo.head() {
            Ok(head) if head.is_branch() => {
                Ok(BranchState::Branch(head.shorthand().unwrap_or("HEAD").to_string()))
            }
            Ok(_) => Ok(BranchState::Branch("HEAD".to_string())),
            Err(err) if err.code() == ErrorCode::UnbornBranch => {
                let head = repo.find_reference("HEAD").map_err(git_err("read HEAD"))?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                Ok(BranchState::Branch(
                    target.trim_start_matches("refs/heads/").to_string(),
                ))
            }
            Err(err) => Err(git_err("read HEAD")(err)),
        }
    }

    fn stage(&self, repo: &Repository, relative_path: &Path) -> Result<(), VcsError> {
        let path = git_path(relative_path);
        let mut index = repo.index().map_err(git_err("stage"))?;
        index.add_path(Path::new(&path)).map_err(git_err("stage"))?;
        index.write().map_err(git_err("stage"))?;
        tracing::debug!("staged {path}");
        Ok(())
    }

    fn has_effective_change(&self, repo: &Repository, relative_path: &Path) -> Result<bool, VcsError> {
        let path = git_path(relative_path);
        let index = repo.index().map_err(git_err("read index"))?;
        let staged = index.get_path(Path::new(&path), 0).map(|e| (e.id, e.mode));
        let head = head_entry(repo, &path)?;
        Ok(staged != head)
    }

    fn commit(
        &self,
        repo: &Repository,
        relative_path: &Path,
        message: &str,
    ) -> Result<RevisionId, VcsError> {
        let path = git_path(relative_path);
        let index = repo.index().map_err(git_err("commit"))?;
        let entry = index
            .get_path(Path::new(&path), 0)
            .ok_or_else(|| VcsError::backend("commit", format!("{path} is not staged")))?;
        let parent = head_commit(repo)?;

        // An unborn branch starts from the empty tree.
        let base = match &parent {
            Some(parent) => parent.tree().map_err(git_err("commit"))?,
            None => {
                let empty = repo
                    .treebuilder(None)
                    .and_then(|builder| builder.write())
                    .map_err(git_err("commit"))?;
                repo.find_tree(empty).map_err(git_err("commit"))?
            }
        };
        let mut update = TreeUpdateBuilder::new();
        update.upsert(path.as_str(), entry.id, file_mode(entry.mode));
        let tree_id = update
            .create_updated(repo, &base)
            .map_err(git_err("commit"))?;
        let tree = repo.find_tree(tree_id).map_err(git_err("commit"))?;
        let signature = self.signature(repo)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(git_err("commit"))?;
        tracing::info!("committed {path} as {oid}");
        Ok(RevisionId(oid.to_string()))
    }

    fn push(&self, repo: &Repository) -> Result<(), VcsError> {
        let head = repo.head().map_err(git_err("push"))?;
        if !head.is_branch() {
            return Err(VcsError::backend("push", "HEAD is detached; no branch to push"));
        }
        let refname = head
            .name()
            .ok_or_else(|| VcsError::backend("push", "branch name is not valid UTF-8"))?
            .to_string();
        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(git_err("push"))?;
        let config = repo.config().map_err(git_err("push"))?;

        let mut rejected: Option<String> = None;
        {
            let mut callbacks = RemoteCallbacks::new();
            let mut attempts = CredentialAttempts::default();
            callbacks.credentials(move |url, username, allowed| {
                match attempts.next(allowed, username.is_some()) {
                    Some(CredentialSource::SshAgent) => {
                        Cred::ssh_key_from_agent(username.unwrap_or("git"))
                    }
                    Some(CredentialSource::Helper) => Cred::credential_helper(&config, url, username),
                    Some(CredentialSource::Default) => Cred::default(),
                    None => Err(git2::Error::from_str(&format!(
                        "authentication failed for {url}"
                    ))),
                }
            });
            callbacks.push_update_reference(|reference, status| {
                if let Some(status) = status {
                    rejected = Some(format!("{reference}: {status}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("{refname}:{refname}");
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(git_err("push"))?;
        }

        if let Some(reason) = rejected {
            return Err(VcsError::backend("push", format!("rejected {reason}")));
        }
        tracing::info!("pushed {refname} to {}", self.remote);
        Ok(())
    }

    fn head_revision(&self, repo: &Repository) -> Result<Option<RevisionId>, VcsError> {
        Ok(head_commit(repo)?.map(|c| RevisionId(c.id().to_string())))
    }

    fn parent_revision(
        &self,
        repo: &Repository,
        revision: &RevisionId,
    ) -> Result<Option<RevisionId>, VcsError> {
        let commit = repo
            .find_commit(parse_oid(revision)?)
            .map_err(git_err("find revision"))?;
        if commit.parent_count() == 0 {
            return Ok(None);
        }
        let parent = commit.parent_id(0).map_err(git_err("find revision"))?;
        Ok(Some(RevisionId(parent.to_string())))
    }

    fn is_dirty(&self, repo: &Repository) -> Result<bool, VcsError> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = repo
            .statuses(Some(&mut options))
            .map_err(git_err("status"))?;
        Ok(!statuses.is_empty())
    }

    fn hard_reset_to(&self, repo: &Repository, revision: &RevisionId) -> Result<(), VcsError> {
        let target = repo
            .find_object(parse_oid(revision)?, None)
            .map_err(git_err("reset"))?;
        repo.reset(&target, ResetType::Hard, None)
            .map_err(git_err("reset"))?;
        tracing::info!("reset working tree to {revision}");
        Ok(())
    }
}
