use crate::domain::paths::touches_any;
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, DiffSummary, PushTarget, Repository};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A commit held by [`MockRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub hash: String,
    pub message: String,
    pub files: Vec<String>,
}

/// In-memory repository for testing without actual git operations.
///
/// History is linear: HEAD is the last commit added. Any operation can be
/// made to fail with [`MockRepository::fail_on`], using the trait method name
/// (e.g. `"commit"`, `"create_tag"`).
#[derive(Debug, Clone)]
pub struct MockRepository {
    commits: Vec<MockCommit>,
    tags: BTreeMap<String, usize>,
    branch: String,
    dirty: bool,
    stashes: Vec<String>,
    staged: Vec<String>,
    pushes: Vec<(String, PushTarget)>,
    resets: usize,
    identity: Option<(String, String)>,
    failures: HashSet<String>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: BTreeMap::new(),
            branch: "main".to_string(),
            dirty: false,
            stashes: Vec::new(),
            staged: Vec::new(),
            pushes: Vec::new(),
            resets: 0,
            identity: None,
            failures: HashSet::new(),
        }
    }

    /// Add a commit touching `files` on top of HEAD, returning its hash
    pub fn add_commit(&mut self, message: impl Into<String>, files: &[&str]) -> String {
        let hash = format!("{:040x}", self.commits.len() + 1);
        self.commits.push(MockCommit {
            hash: hash.clone(),
            message: message.into(),
            files: files.iter().map(|f| f.to_string()).collect(),
        });
        hash
    }

    /// Add a tag pointing to HEAD
    pub fn add_tag(&mut self, name: impl Into<String>) {
        let head = self.commits.len().saturating_sub(1);
        self.tags.insert(name.into(), head);
    }

    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Mark the working tree as having local modifications
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Push a stash entry that was not created by a release run
    pub fn add_stash(&mut self, message: impl Into<String>) {
        self.stashes.push(message.into());
    }

    /// Make the named operation fail from now on
    pub fn fail_on(&mut self, operation: &str) {
        self.failures.insert(operation.to_string());
    }

    pub fn commits(&self) -> &[MockCommit] {
        &self.commits
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// Stash messages, oldest first
    pub fn stashes(&self) -> &[String] {
        &self.stashes
    }

    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    pub fn pushes(&self) -> &[(String, PushTarget)] {
        &self.pushes
    }

    pub fn reset_count(&self) -> usize {
        self.resets
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn identity(&self) -> Option<&(String, String)> {
        self.identity.as_ref()
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failures.contains(operation) {
            Err(ReleaseError::repository(format!(
                "injected failure in {}",
                operation
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn glob_matches(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

impl Repository for MockRepository {
    fn is_repository(&self) -> bool {
        !self.failures.contains("is_repository")
    }

    fn current_branch(&self) -> Result<String> {
        self.check("current_branch")?;
        Ok(self.branch.clone())
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        self.check("list_tags")?;
        Ok(self
            .tags
            .keys()
            .filter(|name| glob_matches(pattern, name))
            .cloned()
            .collect())
    }

    fn log(&self, since_tag: Option<&str>, paths: &[String]) -> Result<Vec<CommitInfo>> {
        self.check("log")?;
        let start = match since_tag {
            Some(tag) => {
                let index = self
                    .tags
                    .get(tag)
                    .ok_or_else(|| ReleaseError::history(format!("tag '{}' not found", tag)))?;
                index + 1
            }
            None => 0,
        };

        Ok(self
            .commits
            .iter()
            .skip(start)
            .filter(|c| touches_any(&c.files, paths))
            .map(|c| CommitInfo {
                hash: c.hash.clone(),
                message: c.message.clone(),
            })
            .collect())
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        self.check("has_uncommitted_changes")?;
        Ok(self.dirty || !self.staged.is_empty())
    }

    fn stash_push(&mut self, label: &str) -> Result<()> {
        self.check("stash_push")?;
        self.stashes.push(label.to_string());
        self.dirty = false;
        Ok(())
    }

    fn stash_pop(&mut self) -> Result<()> {
        self.check("stash_pop")?;
        self.stashes
            .pop()
            .ok_or_else(|| ReleaseError::repository("no stash entries"))?;
        self.dirty = true;
        Ok(())
    }

    fn latest_stash_message(&mut self) -> Result<Option<String>> {
        self.check("latest_stash_message")?;
        Ok(self.stashes.last().cloned())
    }

    fn add(&mut self, path: &Path) -> Result<()> {
        self.check("add")?;
        let path = path.to_string_lossy().replace('\\', "/");
        if !self.staged.contains(&path) {
            self.staged.push(path);
        }
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        self.check("commit")?;
        if self.staged.is_empty() {
            return Err(ReleaseError::repository("nothing to commit"));
        }
        let files: Vec<String> = std::mem::take(&mut self.staged);
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        Ok(self.add_commit(message, &refs))
    }

    fn create_tag(&mut self, name: &str) -> Result<()> {
        self.check("create_tag")?;
        if self.commits.is_empty() {
            return Err(ReleaseError::repository("cannot tag an empty history"));
        }
        if self.tags.contains_key(name) {
            return Err(ReleaseError::repository(format!(
                "tag '{}' already exists",
                name
            )));
        }
        self.add_tag(name);
        Ok(())
    }

    fn push(&mut self, remote: &str, target: &PushTarget) -> Result<()> {
        self.check("push")?;
        self.pushes.push((remote.to_string(), target.clone()));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.check("reset")?;
        self.staged.clear();
        self.resets += 1;
        Ok(())
    }

    fn diff_summary(&self, staged: bool) -> Result<DiffSummary> {
        self.check("diff_summary")?;
        let changed = if staged {
            self.staged.len()
        } else {
            usize::from(self.dirty)
        };
        Ok(DiffSummary {
            insertions: changed,
            deletions: changed,
            changed,
        })
    }

    fn set_identity(&mut self, name: &str, email: &str) -> Result<()> {
        self.check("set_identity")?;
        self.identity = Some((name.to_string(), email.to_string()));
        Ok(())
    }
}
