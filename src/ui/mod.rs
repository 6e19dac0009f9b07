//! User interface module - progress and summary output.
//!
//! Separates concerns:
//! - `formatter` - Pure line builders and the printers that use them
//! - This module - Re-exports for callers

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_decision, display_error, display_status, display_success,
    display_summary, format_decision, format_summary,
};
