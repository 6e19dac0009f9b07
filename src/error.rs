use thiserror::Error;

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("History inconsistency: {0}")]
    History(String),

    #[error("Repository operation failed: {0}")]
    Repository(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of a [`ReleaseError`], used at the CLI boundary to
/// tell configuration problems apart from failures during a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Version,
    HistoryInconsistency,
    RepositoryOperation,
}

/// Convenience type alias for Results in mono-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a history inconsistency error with context
    pub fn history(msg: impl Into<String>) -> Self {
        ReleaseError::History(msg.into())
    }

    /// Create a repository operation error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        ReleaseError::Repository(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::Config(_) => ErrorKind::Configuration,
            ReleaseError::Version(_) => ErrorKind::Version,
            ReleaseError::History(_) => ErrorKind::HistoryInconsistency,
            ReleaseError::Repository(_) | ReleaseError::Git(_) | ReleaseError::Io(_) => {
                ErrorKind::RepositoryOperation
            }
        }
    }
}
