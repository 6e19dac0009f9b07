use crate::boundary::BoundaryWarning;
use crate::domain::{sort_release_tags, CommitRecord, ReleaseTag};
use crate::error::Result;
use crate::git::Repository;
use tracing::debug;

/// Commits of one project's release range, oldest first.
///
/// Reflects a single history query; iterating consumes it.
#[derive(Debug)]
pub struct CommitStream {
    inner: std::vec::IntoIter<CommitRecord>,
}

impl CommitStream {
    fn new(records: Vec<CommitRecord>) -> Self {
        CommitStream {
            inner: records.into_iter(),
        }
    }
}

impl Iterator for CommitStream {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for CommitStream {}

/// Result of scoping a project's history
#[derive(Debug)]
pub struct ScopedHistory {
    /// Exclusive lower bound used for the range, `None` for full history
    pub last_tag: Option<String>,
    pub commits: CommitStream,
    pub warnings: Vec<BoundaryWarning>,
}

/// Finds the commits relevant to a project since its last release.
///
/// A commit is relevant when it touches the project path or any common path;
/// commits touching both appear once.
pub struct HistoryScoper<'a, R: Repository> {
    repo: &'a R,
    common: &'a [String],
}

impl<'a, R: Repository> HistoryScoper<'a, R> {
    pub fn new(repo: &'a R, common: &'a [String]) -> Self {
        HistoryScoper { repo, common }
    }

    /// Scope the history of `project`, whose manifest declares `version`.
    ///
    /// The lower bound is the tag `{project}-{version}`. When that tag does not
    /// exist the whole history is scanned and a
    /// [`BoundaryWarning::MissingReleaseTag`] is returned alongside the commits.
    pub fn scope(&self, project: &str, version: &str) -> Result<ScopedHistory> {
        let names = self.repo.list_tags(&ReleaseTag::pattern(project))?;
        let mut warnings: Vec<BoundaryWarning> = unparsable_tags(project, &names).collect();

        let sorted = sort_release_tags(project, &names);
        let expected = ReleaseTag::name_for(project, version);

        let last_tag = if names.iter().any(|name| *name == expected) {
            Some(expected)
        } else {
            warnings.push(BoundaryWarning::MissingReleaseTag {
                project: project.to_string(),
                expected_tag: expected,
                latest_tag: sorted.first().map(|t| t.to_string()),
            });
            None
        };

        let paths = self.paths_for(project);
        let records: Vec<CommitRecord> = self
            .repo
            .log(last_tag.as_deref(), &paths)?
            .into_iter()
            .enumerate()
            .map(|(position, info)| CommitRecord::new(info.hash, info.message, position))
            .collect();

        debug!(
            project,
            last_tag = ?last_tag,
            commits = records.len(),
            "Scoped project history"
        );

        Ok(ScopedHistory {
            last_tag,
            commits: CommitStream::new(records),
            warnings,
        })
    }

    fn paths_for(&self, project: &str) -> Vec<String> {
        let mut paths = vec![project.to_string()];
        for common in self.common {
            if !paths.contains(common) {
                paths.push(common.clone());
            }
        }
        paths
    }
}

/// Tags that look like versions of `project` but are not valid semantic versions.
fn unparsable_tags<'n>(
    project: &'n str,
    names: &'n [String],
) -> impl Iterator<Item = BoundaryWarning> + 'n {
    let prefix = ReleaseTag::prefix(project);
    names.iter().filter_map(move |name| {
        let rest = name.strip_prefix(&prefix)?;
        let looks_versioned = rest.starts_with(|c: char| c.is_ascii_digit());
        match semver::Version::parse(rest) {
            Err(e) if looks_versioned => Some(BoundaryWarning::UnparsableTag {
                tag: name.clone(),
                reason: e.to_string(),
            }),
            _ => None,
        }
    })
}
