//! Main workflow orchestration logic
//!
//! Provides a clean separation between CLI argument parsing and the release
//! machinery: the binary maps its arguments onto the structs here, and the
//! workflows can be called programmatically without depending on clap.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::error::{ReleaseError, Result};
use crate::git::Git2Repository;
use crate::release::{Orchestrator, ReleaseOptions, ReleaseReport};

/// Arguments for the release workflow
///
/// Mirrors the CLI arguments of `mono-release release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseWorkflowArgs {
    /// Path to a custom config file; `release.toml` at the repository root otherwise
    pub config_path: Option<PathBuf>,

    /// Compute and report without touching files, the index, or tags
    pub dry_run: bool,

    /// Push the current branch and all tags after tagging
    pub push: bool,

    /// Remote used for pushing
    pub remote: String,

    pub git_username: Option<String>,
    pub git_email: Option<String>,
}

impl Default for ReleaseWorkflowArgs {
    fn default() -> Self {
        ReleaseWorkflowArgs {
            config_path: None,
            dry_run: false,
            push: false,
            remote: "origin".to_string(),
            git_username: None,
            git_email: None,
        }
    }
}

impl ReleaseWorkflowArgs {
    /// Identity for the release commit.
    ///
    /// Name and email must be given together.
    pub fn identity(&self) -> Result<Option<(String, String)>> {
        match (&self.git_username, &self.git_email) {
            (Some(name), Some(email)) => Ok(Some((name.clone(), email.clone()))),
            (None, None) => Ok(None),
            _ => Err(ReleaseError::config(
                "--git.username and --git.email must be given together",
            )),
        }
    }

    /// Run options derived from these arguments
    pub fn options(&self) -> Result<ReleaseOptions> {
        Ok(ReleaseOptions {
            dry_run: self.dry_run,
            push: self.push,
            remote: self.remote.clone(),
            identity: self.identity()?,
        })
    }
}

/// Result of `mono-release init`
#[derive(Debug, Clone, PartialEq)]
pub struct InitWorkflowResult {
    /// Where the configuration was written
    pub path: PathBuf,
    pub config: Config,
}

/// Main release workflow
///
/// 1. Open the repository containing the current directory
/// 2. Load configuration relative to the repository root
/// 3. Run the release orchestrator
///
/// Configuration problems are reported before the repository is touched.
pub fn run_release_workflow(args: &ReleaseWorkflowArgs) -> Result<ReleaseReport> {
    let options = args.options()?;
    let mut repo = Git2Repository::open(".")?;
    let root = repo
        .workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| ReleaseError::repository("bare repositories cannot be released"))?;

    let config = config::load_config(args.config_path.as_deref(), &root)?;
    Orchestrator::new(&mut repo, &config, root, options).run()
}

/// Write a default `release.toml` in `root` listing discovered projects
pub fn run_init_workflow(root: &Path, force: bool) -> Result<InitWorkflowResult> {
    let (path, config) = config::init_config(root, force)?;
    Ok(InitWorkflowResult { path, config })
}
