//! End-to-end scenarios driven through the state machines over real HTTP

use crate::filesystem_validator::validate_stored_dump;
use crate::test_utils::create_dump;
use anyhow::{bail, Context, Result};
use common::{Case, CaseProcessingStatus, CaseStatus};
use repository::CaseRepository;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;
use workflow::{
    CaseOperationsController, FetchOutcome, ListingController, ListingView, RefreshOutcome,
    SubmitOutcome, UploadController,
};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub const DUMP_CONTENT: &[u8] = b"MEMDUMP\x00\x01\x02 e2e test image";

/// Upload `name` through the upload state machine and return the created case
pub async fn upload(
    repository: &Arc<CaseRepository>,
    dump_dir: &Path,
    file_name: &str,
    content: &[u8],
    case_name: &str,
) -> Result<Case> {
    let path = create_dump(dump_dir, file_name, content)?;
    let controller = UploadController::new(repository.clone());
    controller.select_file(&path).await?;
    match controller.submit(case_name, Some("uploaded by e2e"), 5).await? {
        SubmitOutcome::Created(case) => Ok(case),
        other => bail!("Upload of {} did not create a case: {:?}", file_name, other),
    }
}

/// Fetch status until it is terminal, failing after `timeout`
pub async fn wait_for_terminal(
    ops: &CaseOperationsController,
    timeout: Duration,
) -> Result<Vec<CaseProcessingStatus>> {
    let started = Instant::now();
    let mut seen = Vec::new();
    loop {
        let status = match ops.fetch_status().await {
            FetchOutcome::Loaded(status) => status,
            other => bail!("Status fetch failed: {:?}", other),
        };
        debug!(status = %status.status, progress = status.progress, "polled status");
        let terminal = status.status.is_terminal();
        seen.push(status);
        if terminal {
            return Ok(seen);
        }
        if started.elapsed() > timeout {
            bail!("Case {} did not finish within {:?}", ops.snapshot().case_id(), timeout);
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Upload, follow the pipeline to completion, then read details and report
pub async fn run_lifecycle(
    repository: &Arc<CaseRepository>,
    dump_dir: &Path,
    data_dir: Option<&Path>,
    timeout: Duration,
) -> Result<Case> {
    println!("\n📤 Uploading dump.raw...");
    let case = upload(repository, dump_dir, "dump.raw", DUMP_CONTENT, "Case A").await?;
    if case.status != CaseStatus::Queued {
        bail!("New case should be queued, got {}", case.status);
    }
    println!("  ✓ Case {} created (queued)", case.id);

    let ops = CaseOperationsController::new(repository.clone(), case.id.clone());
    let history = wait_for_terminal(&ops, timeout).await?;
    for pair in history.windows(2) {
        if pair[0].status.is_terminal() {
            bail!("Status changed after reaching {}", pair[0].status);
        }
    }
    let last = history.last().context("No status polled")?;
    if last.status != CaseStatus::Completed || last.progress != 100 {
        bail!("Expected completed at 100%, got {} at {}%", last.status, last.progress);
    }
    if history.iter().any(|status| status.progress > 100) {
        bail!("Progress out of range");
    }
    println!("  ✓ Case completed after {} status polls", history.len());

    let details = match ops.fetch_details().await {
        FetchOutcome::Loaded(case) => case,
        other => bail!("Details fetch failed: {:?}", other),
    };
    if details.original_filename() != Some("dump.raw") {
        bail!("Original filename not recorded: {:?}", details.metadata);
    }
    println!("  ✓ Details report original filename dump.raw");

    let report = match ops.fetch_report().await {
        FetchOutcome::Loaded(report) => report,
        other => bail!("Report fetch failed: {:?}", other),
    };
    if report.case_id != case.id || report.report_data.get("summary").is_none() {
        bail!("Unexpected report: {:?}", report);
    }
    if report.generated_at.is_none() {
        bail!("Report has no generation time");
    }
    println!("  ✓ Report retrieved");

    if let Some(data_dir) = data_dir {
        validate_stored_dump(data_dir, &details, DUMP_CONTENT)?;
    }

    Ok(details)
}

/// Lookups of an unknown id surface "Case not found" in every fetch kind
pub async fn run_not_found(repository: &Arc<CaseRepository>) -> Result<()> {
    println!("\n🔍 Looking up a missing case...");
    let ops = CaseOperationsController::new(repository.clone(), "999999");
    let expected = "Case not found".to_string();
    if ops.fetch_details().await != FetchOutcome::Failed(expected.clone()) {
        bail!("Details of a missing case did not fail with not-found");
    }
    if ops.fetch_status().await != FetchOutcome::Failed(expected.clone()) {
        bail!("Status of a missing case did not fail with not-found");
    }
    if ops.fetch_report().await != FetchOutcome::Failed(expected) {
        bail!("Report of a missing case did not fail with not-found");
    }
    println!("  ✓ All fetch kinds report not found");
    Ok(())
}

/// A dump with an unsupported extension never reaches the server
pub async fn run_rejected_extension(repository: &Arc<CaseRepository>, dump_dir: &Path) -> Result<()> {
    println!("\n🚫 Selecting an unsupported file...");
    let path = create_dump(dump_dir, "notes.txt", b"not a dump")?;
    let controller = UploadController::new(repository.clone());
    if controller.select_file(&path).await.is_ok() {
        bail!("notes.txt was accepted");
    }
    if controller.submit("Case B", None, 5).await.is_ok() {
        bail!("Submit without a valid selection was accepted");
    }
    let message = controller.snapshot().error().map(str::to_string);
    println!("  ✓ Rejected locally: {}", message.unwrap_or_default());
    Ok(())
}

/// Listing over `count` freshly uploaded cases, page size 10
pub async fn run_listing(
    repository: &Arc<CaseRepository>,
    dump_dir: &Path,
    count: usize,
) -> Result<()> {
    println!("\n📋 Listing {} cases...", count);
    let mut names = Vec::new();
    for i in 0..count {
        let name = format!("Listing case {:02}", i);
        upload(repository, dump_dir, &format!("listing{}.mem", i), DUMP_CONTENT, &name).await?;
        names.push(name);
    }

    let listing = ListingController::new(repository.clone());
    if listing.refresh().await != RefreshOutcome::Applied {
        bail!("First page did not load");
    }
    let snapshot = listing.snapshot();
    let expected_pages = count.div_ceil(10) as u32;
    if snapshot.total() != count as u64 || snapshot.total_pages() != expected_pages {
        bail!(
            "Expected {} cases over {} pages, got {} over {}",
            count,
            expected_pages,
            snapshot.total(),
            snapshot.total_pages()
        );
    }
    if snapshot.cases().len() != count.min(10) {
        bail!("First page holds {} cases", snapshot.cases().len());
    }
    // Newest first
    let newest = names.last().context("No cases uploaded")?;
    if &snapshot.cases()[0].name != newest {
        bail!("Listing is not newest first");
    }
    println!("  ✓ Page 1 of {} holds {} cases", expected_pages, snapshot.cases().len());

    // The oldest case lives on the last page; search cannot see it from page 1
    let oldest = names.first().context("No cases uploaded")?;
    listing.set_search(oldest.as_str());
    if count > 10 && listing.snapshot().view() != ListingView::Empty {
        bail!("Search matched a case outside the loaded page");
    }

    if listing.go_to_page(expected_pages).await != RefreshOutcome::Applied {
        bail!("Last page did not load");
    }
    let snapshot = listing.snapshot();
    match snapshot.view() {
        ListingView::Table(cases) if cases.len() == 1 && &cases[0].name == oldest => {}
        other => bail!("Search on the last page returned {:?}", other),
    }
    println!("  ✓ Search only covers the loaded page");

    Ok(())
}
