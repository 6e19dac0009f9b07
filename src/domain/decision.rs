use crate::domain::ReleaseSeverity;
use semver::Version;

/// Outcome of evaluating one project in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDecision {
    pub project: String,
    pub previous_version: String,
    /// `None` when the project needs no release
    pub next_version: Option<Version>,
    pub severity: ReleaseSeverity,
    /// Number of commits in the scoped range
    pub commit_count: usize,
}

impl ReleaseDecision {
    pub fn none(project: impl Into<String>, previous_version: impl Into<String>) -> Self {
        ReleaseDecision {
            project: project.into(),
            previous_version: previous_version.into(),
            next_version: None,
            severity: ReleaseSeverity::None,
            commit_count: 0,
        }
    }

    pub fn is_release(&self) -> bool {
        self.next_version.is_some()
    }

    /// Release tag name, present only for releasing decisions
    pub fn tag_name(&self) -> Option<String> {
        self.next_version
            .as_ref()
            .map(|v| crate::domain::ReleaseTag::name_for(&self.project, &v.to_string()))
    }
}

/// Decisions recorded during a single run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLedger {
    entries: Vec<ReleaseDecision>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision, replacing any earlier one for the same project
    pub fn record(&mut self, decision: ReleaseDecision) {
        match self
            .entries
            .iter_mut()
            .find(|d| d.project == decision.project)
        {
            Some(existing) => *existing = decision,
            None => self.entries.push(decision),
        }
    }

    pub fn releases(&self) -> impl Iterator<Item = &ReleaseDecision> {
        self.entries.iter().filter(|d| d.is_release())
    }

    pub fn has_releases(&self) -> bool {
        self.releases().next().is_some()
    }

    pub fn into_decisions(self) -> Vec<ReleaseDecision> {
        self.entries
    }
}
