use crate::error::Result;
use crate::git::{DiffSummary, Repository};
use tracing::{debug, warn};

/// Prefix of the stash message used to park local changes during a run
pub const STASH_LABEL_PREFIX: &str = "mono-release: pre-release changes";

/// Proof that a session was opened, carrying what `close` must undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    label: String,
    stashed: bool,
    parked: Option<DiffSummary>,
}

impl SessionToken {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether local changes are currently parked in this session's stash
    pub fn is_stashed(&self) -> bool {
        self.stashed
    }

    /// Unstaged changes to tracked files at the time they were stashed
    pub fn parked(&self) -> Option<DiffSummary> {
        self.parked
    }
}

/// Parks uncommitted local changes for the length of a run.
///
/// The stash entry is recognised by its label and by the token's own record
/// of having stashed; an entry this run did not create is never popped.
pub struct SessionGuard;

impl SessionGuard {
    /// Label unique to this process and moment
    pub fn run_label() -> String {
        format!(
            "{} [{}-{}]",
            STASH_LABEL_PREFIX,
            std::process::id(),
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f")
        )
    }

    /// Stash local changes under `label` if the working tree is dirty.
    pub fn open<R: Repository>(repo: &mut R, label: &str) -> Result<SessionToken> {
        let parked = if repo.has_uncommitted_changes()? {
            let unstaged = repo.diff_summary(false)?;
            repo.stash_push(label)?;
            debug!(
                label,
                files = unstaged.changed,
                insertions = unstaged.insertions,
                deletions = unstaged.deletions,
                "Stashed uncommitted changes for the release run"
            );
            Some(unstaged)
        } else {
            None
        };

        Ok(SessionToken {
            label: label.to_string(),
            stashed: parked.is_some(),
            parked,
        })
    }

    /// Restore the stash created by [`SessionGuard::open`], if any.
    ///
    /// Idempotent: once restored, or when nothing was stashed, this is a no-op.
    pub fn close<R: Repository>(repo: &mut R, token: &mut SessionToken) -> Result<()> {
        if !token.stashed {
            return Ok(());
        }

        match repo.latest_stash_message()? {
            Some(message) if is_session_stash(&message, &token.label) => {
                repo.stash_pop()?;
                debug!(label = %token.label, "Restored stashed changes");
            }
            other => {
                warn!(
                    label = %token.label,
                    latest = ?other,
                    "Session stash is no longer the latest entry; leaving stashes untouched"
                );
            }
        }
        token.stashed = false;
        Ok(())
    }
}

/// git records stash messages as `On <branch>: <label>`.
fn is_session_stash(message: &str, label: &str) -> bool {
    message == label
        || message
            .strip_suffix(label)
            .is_some_and(|head| head.ends_with(": "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_clean_tree_stashes_nothing() {
        let mut repo = MockRepository::new();
        let mut token = SessionGuard::open(&mut repo, "label").unwrap();
        assert!(!token.is_stashed());
        assert_eq!(token.parked(), None);
        assert!(repo.stashes().is_empty());

        SessionGuard::close(&mut repo, &mut token).unwrap();
        assert!(repo.stashes().is_empty());
    }

    #[test]
    fn test_dirty_tree_roundtrip() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);

        let mut token = SessionGuard::open(&mut repo, "label").unwrap();
        assert!(token.is_stashed());
        assert_eq!(token.parked().map(|d| d.changed), Some(1));
        assert!(!repo.is_dirty());

        SessionGuard::close(&mut repo, &mut token).unwrap();
        assert!(repo.is_dirty());
        assert!(repo.stashes().is_empty());

        // Second close must not touch anything
        SessionGuard::close(&mut repo, &mut token).unwrap();
        assert!(repo.is_dirty());
    }

    #[test]
    fn test_unrelated_stash_is_left_alone() {
        let mut repo = MockRepository::new();
        repo.add_stash(format!("On main: {}", STASH_LABEL_PREFIX));

        let mut token = SessionGuard::open(&mut repo, &SessionGuard::run_label()).unwrap();
        SessionGuard::close(&mut repo, &mut token).unwrap();
        assert_eq!(repo.stashes().len(), 1);
    }

    #[test]
    fn test_buried_session_stash_is_not_popped() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);
        let mut token = SessionGuard::open(&mut repo, "ours").unwrap();
        repo.add_stash("someone else");

        SessionGuard::close(&mut repo, &mut token).unwrap();
        assert_eq!(repo.stashes(), ["ours".to_string(), "someone else".to_string()]);
        assert!(!token.is_stashed());
    }

    #[test]
    fn test_is_session_stash() {
        assert!(is_session_stash("label", "label"));
        assert!(is_session_stash("On main: label", "label"));
        assert!(!is_session_stash("On main: other label", "label"));
        assert!(!is_session_stash("On main: label-2", "label"));
    }
}
