//! Output formatting utilities

use crate::error::CliResult;
use colored::*;
use proofpack_verify::{EntryStatus, Severity, Verdict, VerificationReport};
use serde::Serialize;

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print a label/value pair
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<20} {}", format!("{label}:").dimmed(), value);
}

pub fn print_report(report: &VerificationReport) {
    for entry in &report.entries {
        let tier = entry.tier.map_or("-", |t| t.as_str());
        let line = match &entry.status {
            EntryStatus::Matched => continue,
            EntryStatus::Mismatch { algorithms } if algorithms.is_empty() => {
                format!("{} {} ({tier}): size differs", "mismatch".red(), entry.path)
            }
            EntryStatus::Mismatch { algorithms } => {
                let algs: Vec<_> = algorithms.iter().map(|a| a.as_str()).collect();
                format!("{} {} ({tier}): {}", "mismatch".red(), entry.path, algs.join(", "))
            }
            EntryStatus::Missing => format!("{} {} ({tier})", "missing".red(), entry.path),
            EntryStatus::Unreadable { reason } => {
                format!("{} {} ({tier}): {reason}", "unreadable".yellow(), entry.path)
            }
            EntryStatus::Unavailable => {
                format!("{} {} ({tier})", "not checked".dimmed(), entry.path)
            }
            EntryStatus::Unexpected => format!("{} {}", "unexpected".yellow(), entry.path),
        };
        println!("  {line}");
    }

    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Mismatch => "mismatch".red(),
            Severity::Unavailable => "unavailable".yellow(),
            Severity::Info => continue,
        };
        println!("  [{tag}] {}: {}", finding.subject, finding.detail);
    }

    if let Some(combined) = &report.recomputed_combined {
        print_field("combined digest", combined.short());
    }
    print_field("matched", format!("{}/{}", report.matched_count(), report.entries.len()));

    let summary = format!("{} ({})", report.verdict, report.verdict.exit_code());
    match report.verdict {
        Verdict::Verified => print_success(&summary),
        Verdict::MismatchFound => print_error(&summary),
        Verdict::InputsUnavailable => print_warning(&summary),
    }
}
