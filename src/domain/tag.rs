use semver::Version;
use std::fmt;

/// Release tag of a project: always `{project}-{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    pub project: String,
    pub version: Version,
}

impl ReleaseTag {
    pub fn new(project: impl Into<String>, version: Version) -> Self {
        ReleaseTag {
            project: project.into(),
            version,
        }
    }

    /// Tag prefix shared by every release of `project`
    pub fn prefix(project: &str) -> String {
        format!("{}-", project)
    }

    /// Glob pattern matching every release tag of `project`
    pub fn pattern(project: &str) -> String {
        format!("{}-*", project)
    }

    /// Format the tag name for a raw version string
    /// Example: project="api", version="1.2.3" -> "api-1.2.3"
    pub fn name_for(project: &str, version: &str) -> String {
        format!("{}-{}", project, version)
    }

    /// Parse `name` as a release tag of `project`.
    ///
    /// Returns `None` when the name lacks the project prefix or the remainder is
    /// not a semantic version, so `api-gateway-1.0.0` is not a tag of `api`.
    pub fn parse(project: &str, name: &str) -> Option<Self> {
        let rest = name.strip_prefix(&Self::prefix(project))?;
        let version = Version::parse(rest).ok()?;
        Some(ReleaseTag::new(project, version))
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.version)
    }
}

/// Release tags of `project` among `names`, newest version first.
///
/// Names that do not parse as release tags of `project` are dropped.
pub fn sort_release_tags<S: AsRef<str>>(project: &str, names: &[S]) -> Vec<ReleaseTag> {
    let mut tags: Vec<ReleaseTag> = names
        .iter()
        .filter_map(|name| ReleaseTag::parse(project, name.as_ref()))
        .collect();
    tags.sort_by(|a, b| b.version.cmp(&a.version));
    tags
}
