//! Rendering run reports.

use super::OutputFormat;
use console::{style, Term};
use snaptidy::core::context::{FailureCategory, RunStatus};
use snaptidy::core::pipeline::RunReport;
use snaptidy::core::planner::{Operation, OperationKind, OperationStatus, RunKind};
use std::path::Path;

/// Operations listed before the rest is summarized
const LISTED_OPERATIONS: usize = 20;

pub(crate) fn print_report(term: &Term, report: &RunReport, output: OutputFormat, verbose: bool) {
    match output {
        OutputFormat::Pretty => print_pretty(term, report, verbose),
        OutputFormat::Json => print_json(report),
    }
}

fn print_pretty(term: &Term, report: &RunReport, verbose: bool) {
    let summary = &report.summary;
    let headline = match (summary.dry_run, summary.status) {
        (true, _) => format!("{} Dry run of {} complete", style("✓").green().bold(), report.run),
        (false, RunStatus::Success) => {
            format!("{} {} complete", style("✓").green().bold(), report.run)
        }
        (false, RunStatus::SuccessWithWarnings) => format!(
            "{} {} complete with warnings",
            style("!").yellow().bold(),
            report.run
        ),
        (false, RunStatus::Cancelled) => {
            format!("{} {} cancelled", style("✗").red().bold(), report.run)
        }
    };
    term.write_line("").ok();
    term.write_line(&headline).ok();
    term.write_line("").ok();

    if report.run != RunKind::Recovery {
        term.write_line(&format!(
            "  {} files scanned in {:.1}s",
            style(summary.files_scanned).cyan(),
            report.duration_ms as f64 / 1000.0
        ))
        .ok();
    }

    if report.run == RunKind::Dedup {
        term.write_line(&format!(
            "  {} duplicate groups found",
            style(summary.duplicate_groups).cyan()
        ))
        .ok();
        term.write_line(&format!(
            "  {} reclaimable",
            style(format_bytes(summary.reclaimable_bytes)).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} operations planned ({})",
        style(summary.planned).cyan(),
        format_bytes(report.plan.total_bytes())
    ))
    .ok();

    if !summary.dry_run {
        term.write_line(&format!(
            "  {} committed, {} failed, {} skipped",
            style(summary.committed).green(),
            style(summary.failed).red(),
            style(summary.skipped).dim()
        ))
        .ok();
        for (label, bytes) in [
            ("moved", summary.bytes_moved),
            ("copied", summary.bytes_copied),
            ("deleted", summary.bytes_deleted),
        ] {
            if bytes > 0 {
                term.write_line(&format!("  {} {}", style(format_bytes(bytes)).yellow(), label))
                    .ok();
            }
        }
    }

    if summary.unrecoverable > 0 {
        term.write_line(&format!(
            "  {} logged deletions cannot be undone",
            style(summary.unrecoverable).red()
        ))
        .ok();
    }

    let warnings: Vec<_> = FailureCategory::ALL
        .iter()
        .filter_map(|&category| {
            let count = summary.failures.get(category);
            (count > 0).then(|| format!("{}: {}", category, count))
        })
        .collect();
    if !warnings.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Warnings:").bold().underlined()))
            .ok();
        for line in warnings {
            term.write_line(&format!("  {} {}", style("!").yellow(), line)).ok();
        }
        if verbose {
            for diagnostic in &report.diagnostics {
                term.write_line(&format!(
                    "    {} {}",
                    style(display_path(&diagnostic.path)).dim(),
                    diagnostic.message
                ))
                .ok();
            }
        }
    }

    let operations: Vec<&Operation> = if summary.dry_run {
        report.plan.operations.iter().collect()
    } else {
        report
            .execution
            .operations
            .iter()
            .filter(|op| verbose || op.status() == OperationStatus::Failed)
            .collect()
    };
    if !operations.is_empty() {
        term.write_line("").ok();
        let title = if summary.dry_run { "Would apply:" } else { "Operations:" };
        term.write_line(&format!("{}", style(title).bold().underlined())).ok();
        let limit = if verbose { operations.len() } else { LISTED_OPERATIONS };
        for operation in operations.iter().take(limit) {
            term.write_line(&format!("  {}", describe(operation))).ok();
        }
        if operations.len() > limit {
            term.write_line(&format!(
                "  {}",
                style(format!("... and {} more (use --verbose)", operations.len() - limit)).dim()
            ))
            .ok();
        }
    }

    term.write_line("").ok();
    if let Some(log_path) = &report.log_path {
        term.write_line(&format!(
            "{} {}",
            style("Transaction log:").dim(),
            display_path(log_path)
        ))
        .ok();
    } else if summary.dry_run {
        term.write_line(&format!("{}", style("No files were changed.").dim()))
            .ok();
    }
}

fn describe(operation: &Operation) -> String {
    let marker = match operation.status() {
        OperationStatus::Committed => style("✓").green().to_string(),
        OperationStatus::Failed => style("✗").red().to_string(),
        OperationStatus::Planned => style("○").dim().to_string(),
    };
    match (operation.kind(), operation.destination()) {
        (OperationKind::Delete, _) | (_, None) => format!(
            "{} delete {}",
            marker,
            display_path(operation.source())
        ),
        (kind, Some(destination)) => format!(
            "{} {} {} -> {}",
            marker,
            kind,
            display_path(operation.source()),
            display_path(destination)
        ),
    }
}

fn print_json(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} could not serialize report: {}", style("error:").red().bold(), e),
    }
}

/// Shorten paths under the home directory to `~/...`
pub(crate) fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
