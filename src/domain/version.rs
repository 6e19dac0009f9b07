use crate::domain::ReleaseSeverity;
use crate::error::{ReleaseError, Result};
use semver::{BuildMetadata, Prerelease, Version};

/// Parse a manifest version string as a semantic version.
pub fn parse_version(current: &str) -> Result<Version> {
    Version::parse(current.trim()).map_err(|e| {
        ReleaseError::version(format!(
            "'{}' is not a valid semantic version: {}",
            current, e
        ))
    })
}

/// Compute the version that follows `current` for the given severity.
///
/// `current` is validated first, so an invalid version is rejected even when
/// `severity` is [`ReleaseSeverity::None`]. `Ok(None)` means no release.
pub fn resolve_next(current: &str, severity: ReleaseSeverity) -> Result<Option<Version>> {
    let current = parse_version(current)?;
    Ok(bump(&current, severity))
}

/// Bump version according to severity
///
/// Pre-release and build metadata are dropped on every bump.
pub fn bump(current: &Version, severity: ReleaseSeverity) -> Option<Version> {
    let (major, minor, patch) = match severity {
        ReleaseSeverity::None => return None,
        ReleaseSeverity::Major => (current.major + 1, 0, 0),
        ReleaseSeverity::Minor => (current.major, current.minor + 1, 0),
        ReleaseSeverity::Patch => (current.major, current.minor, current.patch + 1),
    };

    Some(Version {
        major,
        minor,
        patch,
        pre: Prerelease::EMPTY,
        build: BuildMetadata::EMPTY,
    })
}
