//! CLI output formatting for all pipeline commands.
//!
//! # Output Format
//!
//! ## Manifests and index
//!
//! One status line per artifact, whether or not it was rewritten:
//!
//! ```text
//! writing: wrote 12 entries → content/writing/manifest.json
//! course react: already up to date (courses/react/manifest.json)
//! ```
//!
//! ## Validate / check-images
//!
//! Issues are a flat, file-prefixed list (paths relative to the project
//! root) followed by a summary. A clean run prints only the summary.
//!
//! ```text
//! content/writing/hooks.md: missing writing slug `effects` (link: /writing/effects)
//! courses/react: duplicate lesson slug `intro` in course `react`
//!
//! 2 issues in 2 files (40 documents validated)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper. Status and success lines go to
//! stdout, issue reports to stderr. Format functions are pure: no I/O, no
//! side effects.

use crate::config::PathsConfig;
use crate::images::ImageReport;
use crate::manifest::{Outcome, Status};
use crate::validate::{Issue, ValidationReport};
use std::collections::HashSet;

// ============================================================================
// Shared helpers
// ============================================================================

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn eprint_lines(lines: Vec<String>) {
    for line in lines {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Manifests and index
// ============================================================================

/// Format the status line for one generated artifact.
pub fn format_outcome(outcome: &Outcome, paths: &PathsConfig) -> String {
    let path = paths.display(&outcome.path);
    match outcome.status {
        Status::Written { entries } => format!(
            "{}: wrote {} \u{2192} {}",
            outcome.label,
            plural(entries, "entry", "entries"),
            path
        ),
        Status::UpToDate => format!("{}: already up to date ({})", outcome.label, path),
    }
}

pub fn format_outcomes(outcomes: &[Outcome], paths: &PathsConfig) -> Vec<String> {
    if outcomes.is_empty() {
        return vec![format!(
            "no course directories under {}",
            paths.display(&paths.courses)
        )];
    }
    outcomes.iter().map(|o| format_outcome(o, paths)).collect()
}

pub fn print_outcomes(outcomes: &[Outcome], paths: &PathsConfig) {
    print_lines(format_outcomes(outcomes, paths));
}

// ============================================================================
// Issue reports
// ============================================================================

/// Format issues as `file: message` lines, grouped by file in path order.
///
/// The sort is stable: messages for one file keep the order they were found.
pub fn format_issues(issues: &[Issue], paths: &PathsConfig) -> Vec<String> {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.file.cmp(&b.file));
    sorted
        .into_iter()
        .map(|issue| format!("{}: {}", paths.display(&issue.file), issue.message))
        .collect()
}

/// Summary line: `"<checked>: no issues"` or `"<n> issues in <m> files (<checked>)"`.
fn summary(checked: &str, issues: &[Issue]) -> String {
    if issues.is_empty() {
        return format!("{checked}: no issues");
    }
    let files: HashSet<_> = issues.iter().map(|i| &i.file).collect();
    format!(
        "{} in {} ({checked})",
        plural(issues.len(), "issue", "issues"),
        plural(files.len(), "file", "files")
    )
}

fn format_report(issues: &[Issue], checked: &str, paths: &PathsConfig) -> Vec<String> {
    let mut lines = format_issues(issues, paths);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(summary(checked, issues));
    lines
}

fn print_report(lines: Vec<String>, clean: bool) {
    if clean {
        print_lines(lines);
    } else {
        eprint_lines(lines);
    }
}

pub fn format_validation(report: &ValidationReport, paths: &PathsConfig) -> Vec<String> {
    let checked = format!(
        "{} validated",
        plural(report.documents, "document", "documents")
    );
    format_report(&report.issues, &checked, paths)
}

pub fn print_validation(report: &ValidationReport, paths: &PathsConfig) {
    print_report(format_validation(report, paths), report.is_clean());
}

pub fn format_image_report(report: &ImageReport, paths: &PathsConfig) -> Vec<String> {
    let checked = format!("{} checked", plural(report.checked, "image", "images"));
    format_report(&report.issues, &checked, paths)
}

pub fn print_image_report(report: &ImageReport, paths: &PathsConfig) {
    print_report(format_image_report(report, paths), report.issues.is_empty());
}

// ============================================================================
// Tests
// ============================================================================
