//! Analysis engine for determining release severity from project history

pub mod classifier;
pub mod scoper;

pub use classifier::{classify, classify_commit, fold_severity};
pub use scoper::{CommitStream, HistoryScoper, ScopedHistory};
