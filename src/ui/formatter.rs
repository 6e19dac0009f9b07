//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic for release progress.
//! Line builders (`format_*`) are pure and testable; `display_*` print them.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::domain::ReleaseDecision;
use crate::release::ReleaseReport;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
///
/// Shows a yellow warning icon followed by the warning message.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One-line description of a project decision.
///
/// # Example
/// ```ignore
/// "api: 1.2.0 -> 1.2.1 (patch, 1 commit)"
/// "no release required for web"
/// ```
pub fn format_decision(decision: &ReleaseDecision) -> String {
    match &decision.next_version {
        Some(next) => format!(
            "{}: {} -> {} ({}, {} commit{})",
            decision.project,
            decision.previous_version,
            next,
            decision.severity,
            decision.commit_count,
            if decision.commit_count == 1 { "" } else { "s" }
        ),
        None => format!("no release required for {}", decision.project),
    }
}

/// Print the per-project progress line for a decision.
pub fn display_decision(decision: &ReleaseDecision) {
    let line = format_decision(decision);
    if decision.is_release() {
        display_success(&line);
    } else {
        display_status(&line);
    }
}

/// Summary lines of a finished run.
pub fn format_summary(report: &ReleaseReport) -> Vec<String> {
    let mut lines = Vec::new();
    let released: Vec<&ReleaseDecision> =
        report.decisions.iter().filter(|d| d.is_release()).collect();

    if released.is_empty() {
        lines.push("Nothing to release".to_string());
        return lines;
    }

    let verb = if report.dry_run {
        "Would release"
    } else {
        "Released"
    };
    lines.push(format!(
        "{} {} of {} project(s)",
        verb,
        released.len(),
        report.decisions.len()
    ));

    if let Some(commit) = &report.commit {
        let short = commit.get(..7).unwrap_or(commit);
        match &report.diff {
            Some(diff) => lines.push(format!("Release commit {} ({})", short, diff)),
            None => lines.push(format!("Release commit {}", short)),
        }
    }

    for tag in &report.tags {
        let prefix = if report.dry_run { "would tag" } else { "tagged" };
        lines.push(format!("  {} {}", prefix, tag));
    }

    if report.pushed {
        lines.push("Pushed branch and tags".to_string());
    }
    lines
}

/// Print the final summary of a run.
pub fn display_summary(report: &ReleaseReport) {
    println!();
    let mut lines = format_summary(report).into_iter();
    if let Some(headline) = lines.next() {
        println!("{}", style(headline).bold());
    }
    for line in lines {
        println!("{}", line);
    }
}
