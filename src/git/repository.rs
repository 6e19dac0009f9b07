use crate::domain::paths::normalize_path;
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, DiffSummary, PushTarget};
use git2::{
    Commit, Cred, CredentialType, DiffOptions, ErrorCode, ObjectType, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, ResetType, Signature, Sort, StashFlags, Status,
    StatusOptions,
};
use std::path::Path;
use tracing::debug;

/// Fallback identity when neither `set_identity` nor git config provide one
const FALLBACK_NAME: &str = "mono-release";
const FALLBACK_EMAIL: &str = "mono-release@localhost";

/// Credential attempts before a push gives up
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    identity: Option<(String, String)>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            identity: None,
        }
    }

    /// Root of the working tree, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn signature(&self) -> Result<Signature<'static>> {
        let signature = match &self.identity {
            Some((name, email)) => Signature::now(name, email)?,
            None => match self.repo.signature() {
                Ok(signature) => signature,
                Err(_) => Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?,
            },
        };
        Ok(signature)
    }

    fn tag_commit(&self, tag_name: &str) -> Result<Oid> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag_name))
            .map_err(|e| {
                if e.code() == ErrorCode::NotFound {
                    ReleaseError::history(format!("tag '{}' not found", tag_name))
                } else {
                    ReleaseError::Git(e)
                }
            })?;

        let commit = reference.peel_to_commit().map_err(|e| {
            ReleaseError::history(format!("tag '{}' does not point to a commit: {}", tag_name, e))
        })?;
        Ok(commit.id())
    }

    /// Whether `commit` changes anything under `paths`, compared with its first parent.
    fn commit_touches(&self, commit: &Commit<'_>, paths: &[String]) -> Result<bool> {
        let specs: Vec<String> = paths.iter().map(|p| normalize_path(p)).collect();
        if specs.iter().any(String::is_empty) {
            return Ok(true);
        }

        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };

        let mut options = DiffOptions::new();
        for spec in &specs {
            options.pathspec(spec);
        }

        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
        Ok(diff.deltas().next().is_some())
    }

    fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if attempts == 1 {
                    if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                        return Ok(cred);
                    }
                }

                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = Path::new(&home).join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Ok(config) = git2::Config::open_default() {
                    if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }

            Cred::default()
        });

        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        callbacks
    }
}

impl super::Repository for Git2Repository {
    fn is_repository(&self) -> bool {
        !self.repo.is_bare() && self.repo.workdir().is_some()
    }

    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::repository(format!("cannot resolve HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(ReleaseError::config(
                "HEAD is detached; check out the branch to release first (e.g. `git checkout main`)",
            ));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::repository("branch name is not valid UTF-8"))
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(Some(pattern))?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn log(&self, since_tag: Option<&str>, paths: &[String]) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push_head()?;

        if let Some(tag) = since_tag {
            revwalk.hide(self.tag_commit(tag)?)?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            if self.commit_touches(&commit, paths)? {
                commits.push(CommitInfo {
                    hash: oid.to_string(),
                    message: commit.message().unwrap_or_default().to_string(),
                });
            }
        }

        debug!(since = ?since_tag, ?paths, count = commits.len(), "Scanned history");
        Ok(commits)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(true);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.iter().any(|entry| entry.status() != Status::CURRENT))
    }

    fn stash_push(&mut self, label: &str) -> Result<()> {
        let signature = self.signature()?;
        let oid = self
            .repo
            .stash_save(&signature, label, Some(StashFlags::INCLUDE_UNTRACKED))?;
        debug!(%oid, label, "Stashed local changes");
        Ok(())
    }

    fn stash_pop(&mut self) -> Result<()> {
        self.repo.stash_pop(0, None)?;
        Ok(())
    }

    fn latest_stash_message(&mut self) -> Result<Option<String>> {
        let mut latest = None;
        self.repo.stash_foreach(|index, message, _oid| {
            if index == 0 {
                latest = Some(message.to_string());
            }
            true
        })?;
        Ok(latest)
    }

    fn add(&mut self, path: &Path) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(path)?;
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        let signature = self.signature()?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(oid.to_string())
    }

    fn create_tag(&mut self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| ReleaseError::repository(format!("cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn push(&mut self, remote_name: &str, target: &PushTarget) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| ReleaseError::repository(format!("no remote named '{}'", remote_name)))?;

        let refspecs: Vec<String> = match target {
            PushTarget::Branch(branch) => {
                vec![format!("refs/heads/{}:refs/heads/{}", branch, branch)]
            }
            PushTarget::Tags => self
                .repo
                .tag_names(None)?
                .iter()
                .flatten()
                .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
                .collect(),
        };
        if refspecs.is_empty() {
            return Ok(());
        }

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(Self::remote_callbacks());

        remote
            .push(&refspecs, Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    ReleaseError::repository(format!("network error during push: {}", e))
                } else {
                    ReleaseError::repository(format!(
                        "failed to push to '{}': {}",
                        remote_name, e
                    ))
                }
            })?;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let head = self.repo.head()?.peel(ObjectType::Commit)?;
        self.repo.reset(&head, ResetType::Hard, None)?;
        Ok(())
    }

    fn diff_summary(&self, staged: bool) -> Result<DiffSummary> {
        let diff = if staged {
            let head_tree = match self.repo.head() {
                Ok(head) => Some(head.peel_to_tree()?),
                Err(e) if e.code() == ErrorCode::UnbornBranch => None,
                Err(e) => return Err(e.into()),
            };
            self.repo.diff_tree_to_index(head_tree.as_ref(), None, None)?
        } else {
            self.repo.diff_index_to_workdir(None, None)?
        };

        let stats = diff.stats()?;
        Ok(DiffSummary {
            insertions: stats.insertions(),
            deletions: stats.deletions(),
            changed: stats.files_changed(),
        })
    }

    fn set_identity(&mut self, name: &str, email: &str) -> Result<()> {
        Signature::now(name, email)?;
        self.identity = Some((name.to_string(), email.to_string()));
        Ok(())
    }
}
