use regex::Regex;
use std::sync::LazyLock;

/// Commit type token reported for commits that carry a breaking-change marker.
pub const BREAKING_CHANGE: &str = "BREAKING CHANGE";

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)(?:\(([^)]*)\))?(!)?:\s*(.*)$").expect("header pattern is valid")
});

static BREAKING_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^BREAKING[ -]CHANGE:").expect("footer pattern is valid")
});

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Parse a commit message according to conventional commits spec
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text (empty type)
    pub fn parse(message: &str) -> Self {
        let header = message.lines().next().unwrap_or_default().trim();
        let footer_breaking = BREAKING_FOOTER.is_match(message);

        match HEADER.captures(header) {
            Some(captures) => {
                let r#type = captures
                    .get(1)
                    .map(|m| m.as_str().to_lowercase())
                    .unwrap_or_default();
                let scope = captures
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty());
                let has_exclamation = captures.get(3).is_some();
                let description = captures
                    .get(4)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();

                ParsedCommit {
                    r#type,
                    scope,
                    description,
                    is_breaking_change: has_exclamation || footer_breaking,
                }
            }
            None => ParsedCommit {
                r#type: String::new(),
                scope: None,
                description: header.to_string(),
                is_breaking_change: footer_breaking,
            },
        }
    }

    /// Type tokens used for release classification.
    ///
    /// The header type always counts; breaking commits also report
    /// [`BREAKING_CHANGE`], so custom rules that omit it still see the type.
    pub fn release_types(&self) -> impl Iterator<Item = &str> {
        let breaking: Option<&str> = self.is_breaking_change.then_some(BREAKING_CHANGE);
        std::iter::once(self.r#type.as_str())
            .filter(|t| !t.is_empty())
            .chain(breaking)
    }
}

/// One commit in a project's release range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub parsed: ParsedCommit,
    /// Chronological position within the retrieved range, starting at 0
    pub position: usize,
}

impl CommitRecord {
    pub fn new(hash: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        let message = message.into();
        let parsed = ParsedCommit::parse(&message);
        CommitRecord {
            hash: hash.into(),
            message,
            parsed,
            position,
        }
    }

    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map_or(self.hash.len(), |(i, _)| i);
        &self.hash[..end]
    }
}
