use crate::domain::paths::normalize_path;
use crate::domain::ReleaseSeverity;
use crate::error::{ReleaseError, Result};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up at the repository root
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Manifest files recognised as project roots
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["package.json", "Cargo.toml"];

/// Directories never descended into when discovering projects
const SKIPPED_DIRS: [&str; 2] = ["node_modules", "target"];

/// Represents the complete configuration for a release run.
///
/// Lists the released projects, the shared paths whose changes affect every
/// project, and the commit-type rules used to pick a bump.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_main_branch", alias = "mainBranch")]
    pub main_branch: String,

    #[serde(default)]
    pub projects: Vec<String>,

    #[serde(default)]
    pub common: Vec<String>,

    #[serde(default, alias = "prefixRules")]
    pub prefix_rules: PrefixRules,
}

fn default_main_branch() -> String {
    "main".to_string()
}

/// Commit-type tokens claimed by each releasing severity.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrefixRules {
    #[serde(default = "default_major")]
    pub major: Vec<String>,

    #[serde(default = "default_minor")]
    pub minor: Vec<String>,

    #[serde(default = "default_patch")]
    pub patch: Vec<String>,
}

fn default_major() -> Vec<String> {
    vec![crate::domain::BREAKING_CHANGE.to_string()]
}

fn default_minor() -> Vec<String> {
    vec!["feat".to_string()]
}

fn default_patch() -> Vec<String> {
    vec!["fix".to_string(), "perf".to_string(), "chore".to_string()]
}

impl Default for PrefixRules {
    fn default() -> Self {
        PrefixRules {
            major: default_major(),
            minor: default_minor(),
            patch: default_patch(),
        }
    }
}

impl PrefixRules {
    /// Tokens claimed by `severity`; empty for [`ReleaseSeverity::None`]
    pub fn tokens(&self, severity: ReleaseSeverity) -> &[String] {
        match severity {
            ReleaseSeverity::Major => &self.major,
            ReleaseSeverity::Minor => &self.minor,
            ReleaseSeverity::Patch => &self.patch,
            ReleaseSeverity::None => &[],
        }
    }

    /// Reject rule tables where one token is claimed by two severities.
    pub fn validate(&self) -> Result<()> {
        let mut owners: HashMap<&str, ReleaseSeverity> = HashMap::new();
        for severity in ReleaseSeverity::RELEASING {
            for token in self.tokens(severity) {
                match owners.get(token.as_str()) {
                    Some(owner) if *owner != severity => {
                        return Err(ReleaseError::config(format!(
                            "commit type '{}' is listed under both prefix_rules.{} and prefix_rules.{}",
                            token, owner, severity
                        )));
                    }
                    _ => {
                        owners.insert(token.as_str(), severity);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            main_branch: default_main_branch(),
            projects: Vec::new(),
            common: Vec::new(),
            prefix_rules: PrefixRules::default(),
        }
    }
}

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text)
            .map_err(|e| ReleaseError::config(format!("invalid configuration: {}", e)))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        self.projects = self.projects.iter().map(|p| normalize_path(p)).collect();
        self.common = self.common.iter().map(|p| normalize_path(p)).collect();
    }

    /// Check the invariants the release run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(ReleaseError::config("no projects configured"));
        }
        if self.main_branch.trim().is_empty() {
            return Err(ReleaseError::config("main_branch must not be empty"));
        }
        if let Some(root) = self.projects.iter().find(|p| p.is_empty()) {
            return Err(ReleaseError::config(format!(
                "project path '{}' resolves to the repository root",
                root
            )));
        }
        self.prefix_rules.validate()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ReleaseError::config(format!("cannot serialize configuration: {}", e)))
    }
}

/// Loads configuration from file.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in `root`
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated configuration
/// * `Err(ReleaseError::Config)` - If no file exists or it cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, root: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => root.join(CONFIG_FILE_NAME),
    };

    if !path.is_file() {
        return Err(ReleaseError::config(format!(
            "no configuration found at {} (run `mono-release init` to create one)",
            path.display()
        )));
    }

    let text = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    Config::from_toml(&text)
}

/// Find project directories under `root`, as root-relative paths.
///
/// A project is any sub-directory holding one of [`MANIFEST_FILE_NAMES`].
/// Hidden entries and anything matched by `.gitignore` or `.ignore` files are
/// skipped, as are `node_modules` and `target`. The root itself is never
/// reported.
pub fn discover_projects(root: &Path) -> Result<Vec<String>> {
    let walker = WalkBuilder::new(root)
        .require_git(false)
        .filter_entry(|entry| {
            !SKIPPED_DIRS
                .iter()
                .any(|skipped| entry.file_name() == *skipped)
        })
        .build();

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            ReleaseError::config(format!("cannot scan {}: {}", root.display(), e))
        })?;
        if !entry.file_type().is_some_and(|ft| ft.is_file())
            || !MANIFEST_FILE_NAMES.iter().any(|m| entry.file_name() == *m)
        {
            continue;
        }

        let Some(relative) = entry
            .path()
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
        else {
            continue;
        };
        let project = normalize_path(&relative.to_string_lossy());
        if !project.is_empty() && !found.contains(&project) {
            found.push(project);
        }
    }

    found.sort();
    Ok(found)
}

/// Write a default configuration listing the projects found under `root`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_config(root: &Path, force: bool) -> Result<(PathBuf, Config)> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(ReleaseError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let config = Config {
        projects: discover_projects(root)?,
        ..Config::default()
    };
    fs::write(&path, config.to_toml()?)?;
    Ok((path, config))
}
