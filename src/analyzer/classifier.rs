use crate::config::PrefixRules;
use crate::domain::{CommitRecord, ReleaseSeverity};

/// Map a commit type token to the severity it warrants.
///
/// Rules are checked Major, then Minor, then Patch; the first severity whose
/// token list contains `commit_type` wins. Unknown and empty types yield
/// [`ReleaseSeverity::None`].
pub fn classify(commit_type: &str, rules: &PrefixRules) -> ReleaseSeverity {
    if commit_type.is_empty() {
        return ReleaseSeverity::None;
    }

    ReleaseSeverity::RELEASING
        .into_iter()
        .find(|severity| rules.tokens(*severity).iter().any(|t| t == commit_type))
        .unwrap_or(ReleaseSeverity::None)
}

/// Severity of one commit: the highest of its type and, when breaking, the
/// breaking-change token.
pub fn classify_commit(commit: &CommitRecord, rules: &PrefixRules) -> ReleaseSeverity {
    commit
        .parsed
        .release_types()
        .map(|t| classify(t, rules))
        .max()
        .unwrap_or(ReleaseSeverity::None)
}

/// Highest severity across a batch of commits; `None` for an empty batch.
pub fn fold_severity<'a, I>(commits: I, rules: &PrefixRules) -> ReleaseSeverity
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    commits
        .into_iter()
        .map(|c| classify_commit(c, rules))
        .max()
        .unwrap_or(ReleaseSeverity::None)
}
