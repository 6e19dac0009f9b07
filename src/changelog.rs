//! Markdown changelog sections for released projects.

use crate::domain::CommitRecord;
use crate::error::Result;
use chrono::NaiveDate;
use semver::Version;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// File name of the changelog kept in each project root
pub const CHANGELOG_FILE_NAME: &str = "CHANGELOG.md";

const HEADING: &str = "# Changelog";

/// The commit range a changelog section describes
#[derive(Debug, Clone)]
pub struct ChangelogRange<'a> {
    /// Prefix of the project's release tags, e.g. `api-`
    pub tag_prefix: String,
    /// Lower bound of the range, `None` for the full history
    pub from_tag: Option<&'a str>,
    pub version: &'a Version,
    pub commits: &'a [CommitRecord],
}

impl ChangelogRange<'_> {
    fn title(&self) -> String {
        format!("{}{}", self.tag_prefix, self.version)
    }
}

/// Render one release section.
pub fn render_section(range: &ChangelogRange<'_>, date: NaiveDate) -> String {
    let mut breaking = Vec::new();
    let mut features = Vec::new();
    let mut fixes = Vec::new();
    let mut other = Vec::new();

    for commit in range.commits {
        let bucket = if commit.parsed.is_breaking_change {
            &mut breaking
        } else {
            match commit.parsed.r#type.as_str() {
                "feat" => &mut features,
                "fix" | "perf" => &mut fixes,
                _ => &mut other,
            }
        };
        bucket.push(commit);
    }

    let mut out = String::new();
    let _ = writeln!(out, "## {} ({})", range.title(), date.format("%Y-%m-%d"));
    if let Some(from) = range.from_tag {
        let _ = writeln!(out, "\nChanges since {}.", from);
    }

    for (title, commits) in [
        ("Breaking Changes", &breaking),
        ("Features", &features),
        ("Bug Fixes", &fixes),
        ("Other Changes", &other),
    ] {
        if commits.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n### {}\n", title);
        for commit in commits.iter() {
            let _ = writeln!(out, "{}", render_line(commit));
        }
    }

    out
}

fn render_line(commit: &CommitRecord) -> String {
    let parsed = &commit.parsed;
    let description = if parsed.description.is_empty() {
        commit.message.lines().next().unwrap_or_default()
    } else {
        parsed.description.as_str()
    };

    match &parsed.scope {
        Some(scope) => format!("* **{}:** {} ({})", scope, description, commit.short_hash()),
        None => format!("* {} ({})", description, commit.short_hash()),
    }
}

/// Insert `section` below the changelog heading of `existing`.
pub fn insert_section(existing: &str, section: &str) -> String {
    let body = match existing.strip_prefix(HEADING) {
        Some(rest) => rest.trim_start_matches(['\r', '\n']),
        None => existing.trim_start_matches(['\r', '\n']),
    };

    if body.is_empty() {
        format!("{}\n\n{}", HEADING, section)
    } else {
        format!("{}\n\n{}\n{}", HEADING, section, body)
    }
}

/// Create or update the changelog at `path` with a section for `range`.
pub fn write(path: &Path, range: &ChangelogRange<'_>) -> Result<()> {
    let existing = if path.is_file() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let today = chrono::Local::now().date_naive();
    let section = render_section(range, today);
    fs::write(path, insert_section(&existing, &section))?;
    Ok(())
}
