//! Release run - session handling and the orchestrating state machine

pub mod orchestrator;
pub mod session;

pub use orchestrator::{Orchestrator, ReleaseOptions, ReleaseReport, RunState};
pub use session::{SessionGuard, SessionToken, STASH_LABEL_PREFIX};
