//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! operations a release run needs, so the orchestrator can be driven by a
//! real repository or by a scripted fake in tests.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! Release code depends on the [Repository] trait and receives the
//! implementation explicitly; there is no process-wide handle.
//!
//! ```rust
//! # use mono_release::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> mono_release::Result<()> {
//! let tags = repo.list_tags("api-*")?;
//! let commits = repo.log(tags.first().map(String::as_str), &["api".to_string()])?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Commit information returned by history queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
}

/// Line and file counts of a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub insertions: usize,
    pub deletions: usize,
    pub changed: usize,
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertion(s), {} deletion(s)",
            self.changed, self.insertions, self.deletions
        )
    }
}

/// What to push to a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// A local branch, pushed to the branch of the same name
    Branch(String),
    /// Every local tag
    Tags,
}

/// Version-control operations consumed by a release run.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying failures to [crate::error::ReleaseError::Git] or
/// [crate::error::ReleaseError::Repository]; a missing release tag during
/// [Repository::log] is [crate::error::ReleaseError::History].
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation for scripting Git behaviour
pub trait Repository {
    /// Whether the handle refers to a usable, non-bare repository
    fn is_repository(&self) -> bool;

    /// Short name of the checked-out branch
    ///
    /// # Returns
    /// * `Ok(String)` - Branch name (e.g., "main")
    /// * `Err` - If HEAD is unborn, or detached (reported as a configuration error)
    fn current_branch(&self) -> Result<String>;

    /// Tag names matching a glob `pattern` (e.g., `"api-*"`)
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>>;

    /// Commits in `(since_tag, HEAD]` touching any of `paths`.
    ///
    /// Returns commits in chronological order (oldest first), each at most
    /// once even when it touches several of `paths`. With `since_tag` set to
    /// `None` the whole history reachable from HEAD is in range.
    ///
    /// # Arguments
    /// * `since_tag` - Exclusive lower bound; the tag's commit is not included
    /// * `paths` - Repository-relative directories; an empty string matches everything
    fn log(&self, since_tag: Option<&str>, paths: &[String]) -> Result<Vec<CommitInfo>>;

    /// Whether the working tree or index differ from HEAD (untracked files count)
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Stash all local changes, including untracked files, under `label`
    fn stash_push(&mut self, label: &str) -> Result<()>;

    /// Restore and drop the most recent stash entry
    fn stash_pop(&mut self) -> Result<()>;

    /// Message of the most recent stash entry, if any
    fn latest_stash_message(&mut self) -> Result<Option<String>>;

    /// Stage a repository-relative path
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Commit the index on HEAD, returning the new commit hash
    fn commit(&mut self, message: &str) -> Result<String>;

    /// Create a lightweight tag on HEAD
    fn create_tag(&mut self, name: &str) -> Result<()>;

    /// Push a branch or all tags to `remote`
    fn push(&mut self, remote: &str, target: &PushTarget) -> Result<()>;

    /// Discard staged and unstaged changes to tracked files (hard reset to HEAD)
    fn reset(&mut self) -> Result<()>;

    /// Diff statistics of the index against HEAD (`staged`) or of the working tree against the index
    fn diff_summary(&self, staged: bool) -> Result<DiffSummary>;

    /// Identity used for commits made by this handle
    fn set_identity(&mut self, name: &str, email: &str) -> Result<()>;
}
