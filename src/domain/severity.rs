use std::cmp::Ordering;
use std::fmt;

/// How large a version bump a change warrants.
///
/// The order is `None < Patch < Minor < Major`. It is defined explicitly in
/// [`ReleaseSeverity::rank`] rather than derived from declaration order, so
/// reordering the variants cannot change comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReleaseSeverity {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl ReleaseSeverity {
    /// Severities that can be claimed by prefix rules, in lookup priority.
    pub const RELEASING: [ReleaseSeverity; 3] = [
        ReleaseSeverity::Major,
        ReleaseSeverity::Minor,
        ReleaseSeverity::Patch,
    ];

    fn rank(self) -> u8 {
        match self {
            ReleaseSeverity::None => 0,
            ReleaseSeverity::Patch => 1,
            ReleaseSeverity::Minor => 2,
            ReleaseSeverity::Major => 3,
        }
    }

    /// Whether this severity produces a new version
    pub fn is_release(self) -> bool {
        self != ReleaseSeverity::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseSeverity::None => "none",
            ReleaseSeverity::Patch => "patch",
            ReleaseSeverity::Minor => "minor",
            ReleaseSeverity::Major => "major",
        }
    }
}

impl Ord for ReleaseSeverity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for ReleaseSeverity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReleaseSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(ReleaseSeverity::None < ReleaseSeverity::Patch);
        assert!(ReleaseSeverity::Patch < ReleaseSeverity::Minor);
        assert!(ReleaseSeverity::Minor < ReleaseSeverity::Major);
        assert_eq!(
            ReleaseSeverity::Major.max(ReleaseSeverity::None),
            ReleaseSeverity::Major
        );
    }

    #[test]
    fn test_none_is_identity() {
        for s in ReleaseSeverity::RELEASING {
            assert_eq!(s.max(ReleaseSeverity::None), s);
            assert_eq!(ReleaseSeverity::None.max(s), s);
        }
        assert!(!ReleaseSeverity::None.is_release());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReleaseSeverity::Minor.to_string(), "minor");
        assert_eq!(ReleaseSeverity::default(), ReleaseSeverity::None);
    }
}
