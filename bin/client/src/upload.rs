use anyhow::{bail, Result};
use log::info;
use repository::CaseRepository;
use std::path::Path;
use std::sync::Arc;
use workflow::{SubmitOutcome, UploadController, UploadMachine};

/// Fields of the `upload` subcommand
pub struct UploadArgs<'a> {
    pub file: &'a Path,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub priority: u8,
}

/// Select the dump, submit it and print the created case
pub async fn upload_case(
    repository: Arc<CaseRepository>,
    max_upload_bytes: u64,
    args: UploadArgs<'_>,
) -> Result<()> {
    let controller =
        UploadController::with_machine(repository, UploadMachine::new(max_upload_bytes));

    controller.select_file(args.file).await?;
    if let Some(file) = controller.snapshot().selected_file() {
        info!("Selected {} ({} bytes)", file.file_name, file.size);
    }

    match controller
        .submit(args.name, args.description, args.priority)
        .await?
    {
        SubmitOutcome::Created(case) => {
            println!("Case {} created ({})", case.id, case.status);
            println!("Follow progress with: client watch {}", case.id);
            Ok(())
        }
        SubmitOutcome::Failed(message) => bail!("Upload failed: {message}"),
        SubmitOutcome::AlreadyUploading => bail!("An upload is already in progress"),
    }
}
