//! Domain logic - pure release rules independent of git operations

pub mod branch;
pub mod commit;
pub mod decision;
pub mod paths;
pub mod severity;
pub mod tag;
pub mod version;

pub use branch::BranchContext;
pub use commit::{CommitRecord, ParsedCommit, BREAKING_CHANGE};
pub use decision::{ReleaseDecision, RunLedger};
pub use severity::ReleaseSeverity;
pub use tag::{sort_release_tags, ReleaseTag};
pub use version::{parse_version, resolve_next};
