//! Plain-text rendering of state machine snapshots

use crate::constants::PROGRESS_BAR_WIDTH;
use chrono::{DateTime, Utc};
use common::{Case, CaseProcessingStatus, CaseReport};
use std::fmt::Write;
use workflow::{Listing, ListingView};

pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// `[#########---------------------]  30%`
pub fn progress_bar(progress: u8) -> String {
    let progress = usize::from(progress.min(100));
    let filled = progress * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress
    )
}

pub fn case_details(case: &Case) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Case {}: {}", case.id, case.name);
    let _ = writeln!(out, "  Status:      {}", case.status);
    let _ = writeln!(out, "  Priority:    {}", case.priority);
    if let Some(description) = case.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  Description: {description}");
    }
    if let Some(filename) = case.original_filename() {
        let _ = writeln!(out, "  Dump:        {filename}");
    }
    let _ = writeln!(out, "  Created:     {}", timestamp(&case.created_at));
    let _ = writeln!(out, "  Updated:     {}", timestamp(&case.updated_at));
    for file in &case.files {
        let _ = writeln!(
            out,
            "  File:        {} ({} bytes, sha256 {})",
            file.file_path, file.file_size, file.checksum
        );
    }
    out
}

pub fn status(status: &CaseProcessingStatus) -> String {
    let mut line = format!(
        "Case {} {:<10} {}",
        status.case_id,
        status.status.as_str(),
        progress_bar(status.progress)
    );
    if let Some(task) = &status.current_task {
        let _ = write!(line, "  {task}");
    }
    line
}

pub fn report(report: &CaseReport) -> serde_json::Result<String> {
    let mut out = format!("Report for case {}", report.case_id);
    if let Some(generated_at) = &report.generated_at {
        let _ = write!(out, " (generated {})", timestamp(generated_at));
    }
    out.push('\n');
    out.push_str(&serde_json::to_string_pretty(&report.report_data)?);
    Ok(out)
}

/// Counters, table (or empty state) and page indicator
pub fn listing(listing: &Listing) -> String {
    let mut out = String::new();
    let counters = listing.counters();
    let _ = writeln!(
        out,
        "Total cases: {}   In progress: {}   Completed: {}",
        counters.total_cases, counters.in_progress, counters.completed
    );

    match listing.view() {
        ListingView::Loading => {
            let _ = writeln!(out, "Loading cases...");
        }
        ListingView::Empty => {
            let _ = writeln!(out, "No cases found");
        }
        ListingView::Table(cases) => {
            let _ = writeln!(
                out,
                "{:<8} {:<32} {:<11} {:>8}  {}",
                "ID", "NAME", "STATUS", "PRIORITY", "CREATED"
            );
            for case in cases {
                let _ = writeln!(
                    out,
                    "{:<8} {:<32} {:<11} {:>8}  {}",
                    case.id,
                    truncate(&case.name, 32),
                    case.status.as_str(),
                    case.priority,
                    timestamp(&case.created_at)
                );
            }
        }
    }

    let _ = write!(out, "Page {} of {}", listing.page(), listing.total_pages());
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
