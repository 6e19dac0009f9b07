use std::fmt;

/// Warnings raised while scoping a project's release history.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The tag matching the manifest version does not exist; full history is scanned
    MissingReleaseTag {
        project: String,
        expected_tag: String,
        latest_tag: Option<String>,
    },
    /// No commits touch the project since its last release
    NoNewCommits { project: String, latest_tag: String },
    /// A tag carries the project prefix but no semantic version
    UnparsableTag { tag: String, reason: String },
    /// The run happens outside the configured main branch
    NotOnMainBranch { current: String, main: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::MissingReleaseTag {
                project,
                expected_tag,
                latest_tag,
            } => {
                write!(
                    f,
                    "Release tag '{}' not found for {}; scanning full history",
                    expected_tag, project
                )?;
                if let Some(latest) = latest_tag {
                    write!(f, " (latest release tag is '{}')", latest)?;
                }
                Ok(())
            }
            BoundaryWarning::NoNewCommits {
                project,
                latest_tag,
            } => {
                write!(
                    f,
                    "No new commits for {} since tag '{}'",
                    project, latest_tag
                )
            }
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            BoundaryWarning::NotOnMainBranch { current, main } => {
                write!(
                    f,
                    "Releasing from branch '{}' instead of '{}'",
                    current, main
                )
            }
        }
    }
}
