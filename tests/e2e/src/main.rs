mod filesystem_validator;
mod scenarios;
mod test_utils;

use anyhow::{Context, Result};
use server::pipeline::Pipeline;
use std::time::Duration;
use test_utils::*;

const LISTING_CASES: usize = 12;

/// Pipeline short enough to watch a case go through every stage
fn fast_pipeline() -> Pipeline {
    Pipeline::new(Duration::from_millis(500), Duration::from_secs(2))
}

/// Runs against `SERVER_URL` when set, otherwise against an in-process server
#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("e2e_tests=debug,info")
        .init();

    let dump_dir = tempfile::tempdir().context("Failed to create dump directory")?;

    match std::env::var("SERVER_URL") {
        Ok(server_url) => {
            println!("🌐 Running E2E tests against {}...", server_url);
            wait_for_server(&server_url).await?;
            let repository = repository_for(&server_url)?;
            // External servers use their own pipeline timing
            scenarios::run_lifecycle(&repository, dump_dir.path(), None, Duration::from_secs(300))
                .await?;
            scenarios::run_not_found(&repository).await?;
            scenarios::run_rejected_extension(&repository, dump_dir.path()).await?;
        }
        Err(_) => {
            println!("🧪 Running E2E tests against an in-process server...");
            let server = TestServer::start(fast_pipeline()).await?;
            let repository = repository_for(&server.url)?;
            scenarios::run_lifecycle(
                &repository,
                dump_dir.path(),
                Some(server.data_dir()),
                Duration::from_secs(30),
            )
            .await?;
            scenarios::run_not_found(&repository).await?;
            scenarios::run_rejected_extension(&repository, dump_dir.path()).await?;

            let listing_server = TestServer::start(fast_pipeline()).await?;
            let repository = repository_for(&listing_server.url)?;
            scenarios::run_listing(&repository, dump_dir.path(), LISTING_CASES).await?;
        }
    }

    println!("\n✅ All E2E tests passed!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CaseStatus;
    use workflow::{CaseOperationsController, FetchOutcome, UploadController, UploadState};

    #[actix_web::test]
    async fn test_upload_to_report_lifecycle() {
        let server = TestServer::start(fast_pipeline()).await.unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        let case = scenarios::run_lifecycle(
            &repository,
            dumps.path(),
            Some(server.data_dir()),
            Duration::from_secs(30),
        )
        .await
        .unwrap();
        assert_eq!(case.id, "1");
        assert_eq!(case.name, "Case A");
        assert_eq!(case.status, CaseStatus::Completed);
    }

    #[actix_web::test]
    async fn test_status_moves_through_processing() {
        let server = TestServer::start(Pipeline::new(Duration::from_millis(300), Duration::from_secs(3)))
            .await
            .unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        let case = scenarios::upload(&repository, dumps.path(), "img.vmem", b"data", "Case P")
            .await
            .unwrap();
        let ops = CaseOperationsController::new(repository, case.id);
        let history = scenarios::wait_for_terminal(&ops, Duration::from_secs(30))
            .await
            .unwrap();

        assert!(history.iter().any(|s| s.status == CaseStatus::Processing));
        let processing: Vec<u8> = history
            .iter()
            .filter(|s| s.status == CaseStatus::Processing)
            .map(|s| s.progress)
            .collect();
        assert!(processing.windows(2).all(|w| w[0] <= w[1]));
        assert!(processing.iter().all(|p| *p < 100));
        assert!(history.iter().any(|s| s.current_task.is_some()));
    }

    #[actix_web::test]
    async fn test_empty_dump_fails() {
        let server = TestServer::start(fast_pipeline()).await.unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        let case = scenarios::upload(&repository, dumps.path(), "empty.bin", b"", "Empty")
            .await
            .unwrap();
        let ops = CaseOperationsController::new(repository, case.id);
        let history = scenarios::wait_for_terminal(&ops, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(history.last().unwrap().status, CaseStatus::Failed);
    }

    #[actix_web::test]
    async fn test_not_found_and_rejected_extension() {
        let server = TestServer::start(fast_pipeline()).await.unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        scenarios::run_not_found(&repository).await.unwrap();
        scenarios::run_rejected_extension(&repository, dumps.path())
            .await
            .unwrap();
        assert_eq!(server.state.case_count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_listing_pages_and_search() {
        let server = TestServer::start(fast_pipeline()).await.unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        scenarios::run_listing(&repository, dumps.path(), LISTING_CASES)
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn test_upload_records_form_fields() {
        let server = TestServer::start(fast_pipeline()).await.unwrap();
        let repository = repository_for(&server.url).unwrap();
        let dumps = tempfile::tempdir().unwrap();

        let path = create_dump(dumps.path(), "capture.raw", b"x").unwrap();
        let controller = UploadController::new(repository.clone());
        controller.select_file(&path).await.unwrap();
        let outcome = controller.submit("Case V", None, 3).await.unwrap();
        assert!(matches!(outcome, workflow::SubmitOutcome::Created(_)));
        assert!(matches!(
            controller.snapshot().state(),
            UploadState::Succeeded { .. }
        ));

        let ops = CaseOperationsController::new(repository, "1");
        let FetchOutcome::Loaded(case) = ops.fetch_details().await else {
            panic!("expected case details");
        };
        assert_eq!(case.priority, 3);
        assert_eq!(case.description.as_deref(), Some(""));
    }
}
