//! CLI output formatting for `gensite make`.
//!
//! Each batch prints a one-line summary, then the documents that were left
//! out, grouped by reason. Paths are shown relative to the project directory:
//!
//! ```text
//! articles: 2 processed, 2 failed (theme: default)
//! Missing front matter
//!     no-header.md
//!         Source: content/articles/no-header.md
//! Malformed front matter
//!     bad-header.md
//!         Source: content/articles/bad-header.md
//!         Detail: malformed front matter at line 3: missing or multiple ':' separators in "time: 10:30"
//! ```
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::generate::{DocumentFailure, FailureKind, GenerationReport};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn display_path(path: &Path, project_dir: &Path) -> String {
    path.strip_prefix(project_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn batch_label(report: &GenerationReport) -> String {
    report
        .content_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.content_dir.display().to_string())
}

fn section_title(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::MissingHeader => "Missing front matter",
        FailureKind::MalformedHeader => "Malformed front matter",
    }
}

fn failure_lines(failure: &DocumentFailure, project_dir: &Path) -> Vec<String> {
    let name = failure
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut lines = vec![
        format!("{}{}", indent(1), name),
        format!(
            "{}Source: {}",
            indent(2),
            display_path(&failure.path, project_dir)
        ),
    ];
    if failure.kind == FailureKind::MalformedHeader {
        lines.push(format!("{}Detail: {}", indent(2), failure.detail));
    }
    lines
}

/// Format one batch report.
pub fn format_report(report: &GenerationReport, project_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if report.fell_back {
        lines.push(format!(
            "Couldn't find theme '{}', using fallback theme '{}' from templates/themes/",
            report.requested_theme, report.theme
        ));
    }

    let mut summary = format!(
        "{}: {} processed, {} failed",
        batch_label(report),
        report.processed,
        report.failures.len()
    );
    if report.skipped > 0 {
        summary.push_str(&format!(", {} skipped", report.skipped));
    }
    summary.push_str(&format!(" (theme: {})", report.theme));
    lines.push(summary);

    for kind in [FailureKind::MissingHeader, FailureKind::MalformedHeader] {
        let failures: Vec<&DocumentFailure> = report.failures_of(kind).collect();
        if failures.is_empty() {
            continue;
        }
        lines.push(section_title(kind).to_string());
        for failure in failures {
            lines.extend(failure_lines(failure, project_dir));
        }
    }

    lines
}

/// Format the closing total across batches.
pub fn format_totals(reports: &[GenerationReport]) -> String {
    let processed: usize = reports.iter().map(|r| r.processed).sum();
    let failed: usize = reports.iter().map(|r| r.failures.len()).sum();
    let files: usize = reports.iter().map(|r| r.outputs.len()).sum();
    format!("Generated {files} files from {processed} documents, {failed} failed")
}

pub fn print_report(report: &GenerationReport, project_dir: &Path) {
    for line in format_report(report, project_dir) {
        println!("{}", line);
    }
}

pub fn print_totals(reports: &[GenerationReport]) {
    println!("{}", format_totals(reports));
}
