//! Project manifests: reading the current version and rewriting it in place.
//!
//! Only the version literal is replaced; every other byte of the manifest is
//! preserved.

use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static JSON_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""version"\s*:\s*"([^"]*)""#).expect("json version pattern is valid")
});

static TOML_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*version[ \t]*=[ \t]*"([^"]*)""#).expect("toml version pattern is valid")
});

static PACKAGE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[package\][ \t]*(#.*)?$").expect("package header pattern is valid")
});

static TOML_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[").expect("toml header pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    PackageJson,
    CargoToml,
}

impl ManifestKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::CargoToml => "Cargo.toml",
        }
    }
}

/// A project manifest as read from disk.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub kind: ManifestKind,
    pub path: PathBuf,
    text: String,
    version: String,
}

impl Manifest {
    /// Load the manifest in `project_dir`, preferring `package.json` over `Cargo.toml`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let kind = [ManifestKind::PackageJson, ManifestKind::CargoToml]
            .into_iter()
            .find(|k| project_dir.join(k.file_name()).is_file())
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "no package.json or Cargo.toml in {}",
                    project_dir.display()
                ))
            })?;

        let path = project_dir.join(kind.file_name());
        let text = fs::read_to_string(&path)?;
        Self::parse(kind, path, text)
    }

    /// Build a manifest from already-read text
    pub fn parse(kind: ManifestKind, path: PathBuf, text: String) -> Result<Self> {
        let version = match kind {
            ManifestKind::PackageJson => json_version(&path, &text)?,
            ManifestKind::CargoToml => toml_version(&path, &text)?,
        };
        Ok(Manifest {
            kind,
            path,
            text,
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Manifest text with the version literal replaced by `new_version`.
    pub fn with_version(&self, new_version: &str) -> Result<String> {
        let range = self.version_range().ok_or_else(|| {
            ReleaseError::version(format!(
                "cannot locate version literal \"{}\" in {}",
                self.version,
                self.path.display()
            ))
        })?;

        let mut updated = String::with_capacity(self.text.len() + new_version.len());
        updated.push_str(&self.text[..range.start]);
        updated.push_str(new_version);
        updated.push_str(&self.text[range.end..]);
        Ok(updated)
    }

    fn version_range(&self) -> Option<Range<usize>> {
        match self.kind {
            // Only the top-level key; nested "version" keys belong to other objects
            ManifestKind::PackageJson => JSON_VERSION
                .captures_iter(&self.text)
                .filter(|c| {
                    c.get(0)
                        .is_some_and(|key| json_depth_at(&self.text, key.start()) == Some(1))
                })
                .filter_map(|c| c.get(1))
                .find(|m| m.as_str() == self.version)
                .map(|m| m.range()),
            ManifestKind::CargoToml => {
                let section = package_section(&self.text)?;
                let body = &self.text[section.clone()];
                TOML_VERSION
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .filter(|m| m.as_str() == self.version)
                    .map(|m| (section.start + m.start())..(section.start + m.end()))
            }
        }
    }
}

fn json_version(path: &Path, text: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        ReleaseError::config(format!("cannot parse {}: {}", path.display(), e))
    })?;

    value
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ReleaseError::version(format!("{} has no \"version\" string", path.display()))
        })
}

fn toml_version(path: &Path, text: &str) -> Result<String> {
    let value: toml::Value = toml::from_str(text).map_err(|e| {
        ReleaseError::config(format!("cannot parse {}: {}", path.display(), e))
    })?;

    value
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ReleaseError::version(format!(
                "{} has no literal [package] version",
                path.display()
            ))
        })
}

/// Object and array nesting depth at byte `offset`, or `None` when the offset
/// falls inside a string literal.
fn json_depth_at(text: &str, offset: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in &text.as_bytes()[..offset] {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match byte {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    (!in_string).then_some(depth)
}

/// Byte range of the body of the `[package]` table.
fn package_section(text: &str) -> Option<Range<usize>> {
    let start = PACKAGE_HEADER.find(text)?.end();
    let end = TOML_HEADER
        .find_at(text, start)
        .map_or(text.len(), |m| m.start());
    Some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PACKAGE_JSON: &str = r#"{
  "name": "api",
  "version": "1.2.0",
  "dependencies": {
    "version": "1.2.0"
  }
}
"#;

    const CARGO_TOML: &str = r#"[package]
name = "cli"
version    = "0.4.1" # keep aligned
edition = "2021"

[dependencies]
serde = { version = "1.0" }
"#;

    #[test]
    fn test_package_json_version() {
        let manifest = Manifest::parse(
            ManifestKind::PackageJson,
            PathBuf::from("api/package.json"),
            PACKAGE_JSON.to_string(),
        )
        .unwrap();
        assert_eq!(manifest.version(), "1.2.0");

        let updated = manifest.with_version("1.2.1").unwrap();
        assert_eq!(
            updated,
            PACKAGE_JSON.replacen("\"version\": \"1.2.0\"", "\"version\": \"1.2.1\"", 1)
        );
        assert!(updated.contains("\"dependencies\": {\n    \"version\": \"1.2.0\""));
    }

    #[test]
    fn test_cargo_toml_version_preserves_formatting() {
        let manifest = Manifest::parse(
            ManifestKind::CargoToml,
            PathBuf::from("cli/Cargo.toml"),
            CARGO_TOML.to_string(),
        )
        .unwrap();
        assert_eq!(manifest.version(), "0.4.1");

        let updated = manifest.with_version("0.5.0").unwrap();
        assert!(updated.contains("version    = \"0.5.0\" # keep aligned"));
        assert!(updated.contains("serde = { version = \"1.0\" }"));
        assert_eq!(updated.len(), CARGO_TOML.len());
    }

    #[test]
    fn test_cargo_workspace_version_is_version_error() {
        let text = "[package]\nname = \"x\"\nversion.workspace = true\n";
        let err = Manifest::parse(
            ManifestKind::CargoToml,
            PathBuf::from("x/Cargo.toml"),
            text.to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));
    }

    #[test]
    fn test_missing_version_is_version_error() {
        let err = Manifest::parse(
            ManifestKind::PackageJson,
            PathBuf::from("web/package.json"),
            "{\"name\": \"web\"}".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));
    }

    #[test]
    fn test_load_prefers_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), PACKAGE_JSON).unwrap();
        fs::write(dir.path().join("Cargo.toml"), CARGO_TOML).unwrap();

        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.kind, ManifestKind::PackageJson);
        assert_eq!(manifest.path, dir.path().join("package.json"));
        assert_eq!(manifest.version(), "1.2.0");
    }

    #[test]
    fn test_package_json_skips_nested_version_before_top_level() {
        let text = r#"{
  "name": "api",
  "publishConfig": { "version": "1.2.0", "note": "{\"version\": \"1.2.0\"}" },
  "version": "1.2.0"
}
"#;
        let manifest = Manifest::parse(
            ManifestKind::PackageJson,
            PathBuf::from("api/package.json"),
            text.to_string(),
        )
        .unwrap();

        let updated = manifest.with_version("1.2.1").unwrap();
        assert!(updated.contains(r#""publishConfig": { "version": "1.2.0","#));
        assert!(updated.contains("\"version\": \"1.2.1\"\n}"));
        let reparsed: serde_json::Value = serde_json::from_str(&updated).unwrap();
        assert_eq!(reparsed["version"], "1.2.1");
        assert_eq!(reparsed["publishConfig"]["version"], "1.2.0");
    }

    #[test]
    fn test_json_depth_ignores_braces_in_strings() {
        let text = r#"{"a": "}{", "b": {"c": 1}}"#;
        let top = text.find("\"b\"").unwrap();
        let nested = text.find("\"c\"").unwrap();
        assert_eq!(json_depth_at(text, top), Some(1));
        assert_eq!(json_depth_at(text, nested), Some(2));
        assert_eq!(json_depth_at(text, text.find("}{").unwrap()), None);
    }

    #[test]
    fn test_load_without_manifest_is_config_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Manifest::load(dir.path()),
            Err(ReleaseError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_version_text_is_still_read() {
        let manifest = Manifest::parse(
            ManifestKind::PackageJson,
            PathBuf::from("api/package.json"),
            "{\"version\": \"not-a-version\"}".to_string(),
        )
        .unwrap();
        assert_eq!(manifest.version(), "not-a-version");
    }
}
