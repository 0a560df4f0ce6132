//! `show`, `status`, `report`, `watch` and `list`

use crate::render;
use anyhow::{bail, Context, Result};
use common::{CaseReport, StatusFilter};
use log::{debug, info};
use repository::{CaseRepository, ListQuery};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use workflow::{
    CaseOperationsController, FetchOutcome, Listing, ListingController, RefreshOutcome,
};

fn loaded<T>(outcome: FetchOutcome<T>) -> Result<T> {
    match outcome {
        FetchOutcome::Loaded(value) => Ok(value),
        FetchOutcome::Failed(message) => bail!("{message}"),
        FetchOutcome::AlreadyLoading => bail!("A request for this case is already running"),
    }
}

pub async fn show_case(repository: Arc<CaseRepository>, case_id: &str) -> Result<()> {
    let ops = CaseOperationsController::new(repository, case_id);
    let case = loaded(ops.fetch_details().await)?;
    print!("{}", render::case_details(&case));
    Ok(())
}

pub async fn show_status(repository: Arc<CaseRepository>, case_id: &str) -> Result<()> {
    let ops = CaseOperationsController::new(repository, case_id);
    let status = loaded(ops.fetch_status().await)?;
    println!("{}", render::status(&status));
    Ok(())
}

pub async fn show_report(
    repository: Arc<CaseRepository>,
    case_id: &str,
    output: Option<&Path>,
) -> Result<()> {
    let ops = CaseOperationsController::new(repository, case_id);
    let report = loaded(ops.fetch_report().await)?;
    match output {
        Some(path) => {
            write_report(&report, path)?;
            println!("Report for case {} written to {}", report.case_id, path.display());
        }
        None => println!("{}", render::report(&report)?),
    }
    Ok(())
}

/// Save the report payload as pretty-printed JSON
pub fn write_report(report: &CaseReport, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(&report.report_data)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Wrote report for case {} to {:?}", report.case_id, path);
    Ok(())
}

/// Fetch the status every `interval` until the case reaches a final state
pub async fn watch_case(
    repository: Arc<CaseRepository>,
    case_id: &str,
    interval: Duration,
) -> Result<()> {
    let ops = CaseOperationsController::new(repository, case_id);
    loop {
        let status = loaded(ops.fetch_status().await)?;
        println!("{}", render::status(&status));
        if status.status.is_terminal() {
            return Ok(());
        }
        debug!("Next status poll in {:?}", interval);
        tokio::time::sleep(interval).await;
    }
}

pub struct ListArgs<'a> {
    pub page: u32,
    pub limit: u32,
    pub status: StatusFilter,
    pub search: Option<&'a str>,
}

pub async fn list_cases(repository: Arc<CaseRepository>, args: ListArgs<'_>) -> Result<()> {
    let listing = Listing::with_query(ListQuery {
        page: args.page,
        limit: args.limit,
        status: args.status,
    });
    let controller = ListingController::with_listing(repository, listing);

    match controller.refresh().await {
        RefreshOutcome::Applied => {}
        RefreshOutcome::Failed(message) => bail!("{message}"),
        RefreshOutcome::Superseded | RefreshOutcome::AlreadyLoading => {
            bail!("Listing request was interrupted")
        }
    }
    if let Some(search) = args.search {
        controller.set_search(search);
    }

    println!("{}", render::listing(&controller.snapshot()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_report_saves_payload_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = CaseReport {
            case_id: "5".into(),
            status: None,
            report_data: json!({"summary": "ok", "analysis": {"indicators_found": 0}}),
            generated_at: None,
        };
        write_report(&report, &path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, report.report_data);
    }

    #[test]
    fn test_write_report_bad_path() {
        let report = CaseReport {
            case_id: "5".into(),
            status: None,
            report_data: json!({}),
            generated_at: None,
        };
        assert!(write_report(&report, Path::new("/nonexistent/dir/report.json")).is_err());
    }

    #[test]
    fn test_loaded_maps_failures() {
        assert_eq!(loaded(FetchOutcome::Loaded(3)).unwrap(), 3);
        let err = loaded::<u8>(FetchOutcome::Failed("Case not found".into())).unwrap_err();
        assert_eq!(err.to_string(), "Case not found");
    }
}
