use crate::analyzer::{fold_severity, HistoryScoper};
use crate::boundary::BoundaryWarning;
use crate::changelog::{self, ChangelogRange, CHANGELOG_FILE_NAME};
use crate::config::Config;
use crate::domain::{
    resolve_next, BranchContext, CommitRecord, ReleaseDecision, ReleaseTag, RunLedger,
};
use crate::error::{ReleaseError, Result};
use crate::git::{DiffSummary, PushTarget, Repository};
use crate::manifest::Manifest;
use crate::release::session::SessionGuard;
use crate::ui;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options of a single release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub dry_run: bool,
    pub push: bool,
    pub remote: String,
    /// Author and committer of the release commit, `(name, email)`
    pub identity: Option<(String, String)>,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            dry_run: false,
            push: false,
            remote: "origin".to_string(),
            identity: None,
        }
    }
}

/// Phases of a release run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SessionOpen,
    PerProjectLoop,
    Finalizing,
    Aborting,
    SessionClosed,
}

/// What a run decided and did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseReport {
    /// One decision per configured project, in configured order
    pub decisions: Vec<ReleaseDecision>,
    /// Hash of the release commit, absent when nothing was committed
    pub commit: Option<String>,
    /// Tags created, or that would be created in a dry run
    pub tags: Vec<String>,
    /// Staged diff the release commit was made from
    pub diff: Option<DiffSummary>,
    pub pushed: bool,
    pub dry_run: bool,
    pub warnings: Vec<BoundaryWarning>,
    /// Informational conditions, such as projects with no commits since their tag
    pub notices: Vec<BoundaryWarning>,
}

/// A file changed by the run, with its content before the run
#[derive(Debug, Clone)]
struct WrittenFile {
    path: PathBuf,
    original: Option<String>,
}

/// Drives one release run over every configured project.
///
/// The run is all-or-nothing for anything written or staged: on failure the
/// repository is reset, written files are restored, and local changes parked
/// by the session are brought back before the error is returned.
pub struct Orchestrator<'a, R: Repository> {
    repo: &'a mut R,
    config: &'a Config,
    root: PathBuf,
    options: ReleaseOptions,
    state: RunState,
    ledger: RunLedger,
    staged: Vec<PathBuf>,
    written: Vec<WrittenFile>,
    warnings: Vec<BoundaryWarning>,
    notices: Vec<BoundaryWarning>,
}

impl<'a, R: Repository> Orchestrator<'a, R> {
    /// Create an orchestrator for the repository whose working tree is `root`
    pub fn new(
        repo: &'a mut R,
        config: &'a Config,
        root: impl Into<PathBuf>,
        options: ReleaseOptions,
    ) -> Self {
        Orchestrator {
            repo,
            config,
            root: root.into(),
            options,
            state: RunState::Idle,
            ledger: RunLedger::new(),
            staged: Vec::new(),
            written: Vec::new(),
            warnings: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the release run.
    ///
    /// # Returns
    /// * `Ok(ReleaseReport)` - Every project was evaluated; includes "nothing to release"
    /// * `Err(ReleaseError)` - The first fatal error, after cleanup has completed
    pub fn run(&mut self) -> Result<ReleaseReport> {
        self.state = RunState::Idle;
        self.ledger = RunLedger::new();
        self.staged.clear();
        self.written.clear();
        self.warnings.clear();
        self.notices.clear();

        if !self.repo.is_repository() {
            return Err(ReleaseError::repository(format!(
                "{} is not a git repository",
                self.root.display()
            )));
        }

        if let Some((name, email)) = &self.options.identity {
            self.repo.set_identity(name, email)?;
        }

        let label = SessionGuard::run_label();
        let mut token = SessionGuard::open(&mut *self.repo, &label)?;
        self.transition(RunState::SessionOpen);

        let outcome = self.execute();
        let outcome = match outcome {
            Ok(report) => Ok(report),
            Err(e) => {
                self.transition(RunState::Aborting);
                self.abort();
                Err(e)
            }
        };

        let closed = SessionGuard::close(&mut *self.repo, &mut token);
        self.transition(RunState::SessionClosed);

        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_error)) => {
                warn!(error = %close_error, "Failed to restore stashed changes");
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "Release run state change");
        self.state = next;
    }

    fn execute(&mut self) -> Result<ReleaseReport> {
        let branch = BranchContext::new(self.repo.current_branch()?, &self.config.main_branch);
        if !branch.is_release_branch() {
            self.warn(BoundaryWarning::NotOnMainBranch {
                current: branch.name.clone(),
                main: self.config.main_branch.clone(),
            });
        }

        self.transition(RunState::PerProjectLoop);
        let config = self.config;
        for project in &config.projects {
            let decision = self.process_project(project)?;
            ui::display_decision(&decision);
            self.ledger.record(decision);
        }

        self.transition(RunState::Finalizing);
        self.finalize(&branch)
    }

    fn process_project(&mut self, project: &str) -> Result<ReleaseDecision> {
        let manifest = Manifest::load(&self.root.join(project))?;

        let config = self.config;
        let scoper = HistoryScoper::new(&*self.repo, &config.common);
        let history = scoper.scope(project, manifest.version())?;
        for warning in history.warnings {
            self.warn(warning);
        }
        let last_tag = history.last_tag;
        let commits: Vec<CommitRecord> = history.commits.collect();

        if commits.is_empty() {
            if let Some(tag) = &last_tag {
                self.notice(BoundaryWarning::NoNewCommits {
                    project: project.to_string(),
                    latest_tag: tag.clone(),
                });
            }
        }

        // An unparsable current version fails here even when nothing is releasable
        let severity = fold_severity(&commits, &config.prefix_rules);
        let Some(next) = resolve_next(manifest.version(), severity)? else {
            info!("no release required for {}", project);
            return Ok(ReleaseDecision {
                commit_count: commits.len(),
                ..ReleaseDecision::none(project, manifest.version())
            });
        };

        info!(
            project,
            from = manifest.version(),
            to = %next,
            %severity,
            commits = commits.len(),
            "Release required"
        );

        if !self.options.dry_run {
            let next_text = next.to_string();
            let updated = manifest.with_version(&next_text)?;
            self.write_file(&manifest.path, &updated, Some(manifest.text().to_string()))?;
            self.stage(&manifest.path)?;

            let changelog_path = self.root.join(project).join(CHANGELOG_FILE_NAME);
            let original = read_existing(&changelog_path)?;
            self.written.push(WrittenFile {
                path: changelog_path.clone(),
                original,
            });
            changelog::write(
                &changelog_path,
                &ChangelogRange {
                    tag_prefix: ReleaseTag::prefix(project),
                    from_tag: last_tag.as_deref(),
                    version: &next,
                    commits: &commits,
                },
            )?;
            self.stage(&changelog_path)?;
        }

        Ok(ReleaseDecision {
            project: project.to_string(),
            previous_version: manifest.version().to_string(),
            next_version: Some(next),
            severity,
            commit_count: commits.len(),
        })
    }

    fn finalize(&mut self, branch: &BranchContext) -> Result<ReleaseReport> {
        let mut report = ReleaseReport {
            dry_run: self.options.dry_run,
            ..ReleaseReport::default()
        };

        if !self.staged.is_empty() {
            report.diff = Some(self.repo.diff_summary(true)?);
            let message = release_commit_message(self.ledger.releases());
            let hash = self.repo.commit(&message)?;
            debug!(commit = %hash, "Created release commit");
            report.commit = Some(hash);
            // Committed files belong to history now; abort must not revert them
            self.staged.clear();
            self.written.clear();
        }

        for decision in self.ledger.releases() {
            if let Some(tag) = decision.tag_name() {
                if !self.options.dry_run {
                    self.repo.create_tag(&tag)?;
                    debug!(tag = %tag, "Created release tag");
                }
                report.tags.push(tag);
            }
        }

        if self.options.push && !self.options.dry_run && self.ledger.has_releases() {
            let remote = self.options.remote.clone();
            self.repo
                .push(&remote, &PushTarget::Branch(branch.name.clone()))?;
            self.repo.push(&remote, &PushTarget::Tags)?;
            report.pushed = true;
        }

        report.decisions = std::mem::take(&mut self.ledger).into_decisions();
        report.warnings = self.warnings.clone();
        report.notices = self.notices.clone();
        Ok(report)
    }

    fn abort(&mut self) {
        if !self.options.dry_run {
            if let Err(e) = self.repo.reset() {
                warn!(error = %e, "Failed to reset repository while aborting");
            }
        }

        for file in self.written.drain(..).rev() {
            let restored = match &file.original {
                Some(text) => fs::write(&file.path, text),
                None => match fs::remove_file(&file.path) {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other,
                },
            };
            if let Err(e) = restored {
                warn!(path = %file.path.display(), error = %e, "Failed to restore file while aborting");
            }
        }
        self.staged.clear();
    }

    fn warn(&mut self, warning: BoundaryWarning) {
        warn!("{}", warning);
        ui::display_boundary_warning(&warning);
        self.warnings.push(warning);
    }

    fn notice(&mut self, notice: BoundaryWarning) {
        info!("{}", notice);
        ui::display_status(&notice.to_string());
        self.notices.push(notice);
    }

    fn write_file(&mut self, path: &Path, text: &str, original: Option<String>) -> Result<()> {
        self.written.push(WrittenFile {
            path: path.to_path_buf(),
            original,
        });
        fs::write(path, text)?;
        Ok(())
    }

    fn stage(&mut self, path: &Path) -> Result<()> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        self.repo.add(&relative)?;
        self.staged.push(relative);
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Message of the single commit covering every release in a run.
///
/// # Example
/// ```ignore
/// "chore(release): api-1.2.1, web-2.0.0"
/// ```
fn release_commit_message<'d>(releases: impl Iterator<Item = &'d ReleaseDecision>) -> String {
    let tags: Vec<String> = releases.filter_map(ReleaseDecision::tag_name).collect();
    format!("chore(release): {}", tags.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseSeverity;
    use crate::git::MockRepository;
    use semver::Version;
    use tempfile::TempDir;

    fn workspace(projects: &[(&str, &str)]) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        for (name, version) in projects {
            let project = dir.path().join(name);
            fs::create_dir_all(&project).unwrap();
            fs::write(
                project.join("package.json"),
                format!("{{\n  \"name\": \"{}\",\n  \"version\": \"{}\"\n}}\n", name, version),
            )
            .unwrap();
        }
        let config = Config {
            projects: projects.iter().map(|(n, _)| n.to_string()).collect(),
            ..Config::default()
        };
        (dir, config)
    }

    #[test]
    fn test_commit_message_lists_all_tags() {
        let decisions = [
            ReleaseDecision {
                project: "api".to_string(),
                previous_version: "1.2.0".to_string(),
                next_version: Some(Version::new(1, 2, 1)),
                severity: ReleaseSeverity::Patch,
                commit_count: 1,
            },
            ReleaseDecision::none("docs", "0.1.0"),
            ReleaseDecision {
                project: "web".to_string(),
                previous_version: "1.4.0".to_string(),
                next_version: Some(Version::new(2, 0, 0)),
                severity: ReleaseSeverity::Major,
                commit_count: 3,
            },
        ];
        assert_eq!(
            release_commit_message(decisions.iter()),
            "chore(release): api-1.2.1, web-2.0.0"
        );
    }

    #[test]
    fn test_run_ends_with_session_closed() {
        let (dir, config) = workspace(&[("api", "1.2.0")]);
        let mut repo = MockRepository::new();
        repo.add_commit("chore: init", &["api/package.json"]);
        repo.add_tag("api-1.2.0");

        let mut orchestrator =
            Orchestrator::new(&mut repo, &config, dir.path(), ReleaseOptions::default());
        let report = orchestrator.run().unwrap();
        assert_eq!(orchestrator.state(), RunState::SessionClosed);
        assert!(report.commit.is_none());
        assert!(report.tags.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(
            report.notices,
            vec![BoundaryWarning::NoNewCommits {
                project: "api".to_string(),
                latest_tag: "api-1.2.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_not_a_repository_is_rejected_before_session() {
        let (dir, config) = workspace(&[("api", "1.2.0")]);
        let mut repo = MockRepository::new();
        repo.fail_on("is_repository");

        let mut orchestrator =
            Orchestrator::new(&mut repo, &config, dir.path(), ReleaseOptions::default());
        let err = orchestrator.run().unwrap_err();
        assert!(matches!(err, ReleaseError::Repository(_)));
        assert_eq!(orchestrator.state(), RunState::Idle);
    }

    #[test]
    fn test_failed_project_aborts_whole_run() {
        let (dir, config) = workspace(&[("api", "1.2.0"), ("web", "not-a-version")]);
        let mut repo = MockRepository::new();
        repo.add_commit("chore: init", &["api/package.json", "web/package.json"]);
        repo.add_tag("api-1.2.0");
        repo.add_commit("fix: api bug", &["api/src/x.js"]);

        let original = fs::read_to_string(dir.path().join("api/package.json")).unwrap();
        let mut orchestrator =
            Orchestrator::new(&mut repo, &config, dir.path(), ReleaseOptions::default());
        let err = orchestrator.run().unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));
        assert_eq!(orchestrator.state(), RunState::SessionClosed);

        assert_eq!(repo.reset_count(), 1);
        assert!(repo.staged().is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("api/package.json")).unwrap(),
            original
        );
        assert!(!dir.path().join("api").join(CHANGELOG_FILE_NAME).exists());
    }
}
