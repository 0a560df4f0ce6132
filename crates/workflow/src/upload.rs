//! Upload state machine: `Empty -> FileSelected -> Uploading -> Succeeded | Failed`

use crate::{InFlight, Store, WorkflowError};
use common::file_utils::{self, MAX_UPLOAD_BYTES};
use common::{Case, ValidationError};
use repository::{CaseError, CaseRepository, NewCase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub const UPLOAD_CANCELLED: &str = "Upload cancelled";

/// A dump chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

impl DumpFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            size,
        }
    }

    /// Stat a file on disk
    pub async fn inspect(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let not_a_file = || ValidationError::NotAFile(path.display().to_string());
        let metadata = tokio::fs::metadata(path).await.map_err(|_| not_a_file())?;
        if !metadata.is_file() {
            return Err(not_a_file());
        }
        Ok(Self::new(path, metadata.len()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Empty,
    FileSelected(DumpFile),
    Uploading(DumpFile),
    Succeeded { file: DumpFile, case: Case },
    Failed { file: DumpFile, message: String },
}

impl UploadState {
    fn name(&self) -> &'static str {
        match self {
            UploadState::Empty => "no file is selected",
            UploadState::FileSelected(_) => "a file is selected",
            UploadState::Uploading(_) => "uploading",
            UploadState::Succeeded { .. } => "the upload has succeeded",
            UploadState::Failed { .. } => "the upload has failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadMachine {
    state: UploadState,
    /// Banner text; cleared by `clear_error` or a successful selection
    error: Option<String>,
    max_file_size: u64,
}

impl Default for UploadMachine {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_BYTES)
    }
}

impl UploadMachine {
    pub fn new(max_file_size: u64) -> Self {
        Self {
            state: UploadState::Empty,
            error: None,
            max_file_size,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, UploadState::Uploading(_))
    }

    pub fn selected_file(&self) -> Option<&DumpFile> {
        match &self.state {
            UploadState::Empty => None,
            UploadState::FileSelected(file) | UploadState::Uploading(file) => Some(file),
            UploadState::Succeeded { file, .. } | UploadState::Failed { file, .. } => Some(file),
        }
    }

    /// Id of the case created by a successful upload
    pub fn created_case_id(&self) -> Option<&str> {
        match &self.state {
            UploadState::Succeeded { case, .. } => Some(&case.id),
            _ => None,
        }
    }

    /// Choose a dump. Allowed from `Empty`, `FileSelected` and `Failed`.
    /// A rejected file leaves the state unchanged and surfaces the reason.
    pub fn select_file(&mut self, file: DumpFile) -> Result<(), WorkflowError> {
        match self.state {
            UploadState::Empty | UploadState::FileSelected(_) | UploadState::Failed { .. } => {}
            _ => return Err(self.invalid("select a file")),
        }

        let checked = file_utils::dump_extension(&file.file_name)
            .and_then(|_| file_utils::validate_file_size(file.size, self.max_file_size));
        if let Err(e) = checked {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        self.state = UploadState::FileSelected(file);
        self.error = None;
        Ok(())
    }

    /// Dismiss the banner. A failed upload goes back to `FileSelected` with the same file.
    pub fn clear_error(&mut self) {
        self.error = None;
        if let UploadState::Failed { file, .. } = &self.state {
            self.state = UploadState::FileSelected(file.clone());
        }
    }

    /// Drop the selection and any outcome
    pub fn clear_selection(&mut self) -> Result<(), WorkflowError> {
        if self.is_uploading() {
            return Err(self.invalid("clear the selection"));
        }
        self.state = UploadState::Empty;
        self.error = None;
        Ok(())
    }

    /// Move `FileSelected -> Uploading` and return the request to send.
    /// Rejected in every other state, which makes submission single-flight.
    pub fn begin_submit(
        &mut self,
        name: &str,
        description: Option<&str>,
        priority: u8,
    ) -> Result<NewCase, WorkflowError> {
        let UploadState::FileSelected(file) = &self.state else {
            return Err(self.invalid("submit"));
        };

        let checked = file_utils::validate_case_name(name).and_then(|name| {
            file_utils::validate_priority(i64::from(priority)).map(|priority| (name, priority))
        });
        let (name, priority) = match checked {
            Ok(valid) => valid,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let mut request = NewCase::new(file.path.clone(), name).with_priority(priority);
        if let Some(description) = description {
            request = request.with_description(description);
        }

        self.state = UploadState::Uploading(file.clone());
        self.error = None;
        Ok(request)
    }

    /// Record the repository outcome of the in-flight upload
    pub fn finish_submit(&mut self, result: Result<Case, CaseError>) -> Result<(), WorkflowError> {
        let UploadState::Uploading(file) = &self.state else {
            return Err(self.invalid("finish an upload"));
        };
        let file = file.clone();

        self.state = match result {
            Ok(case) => UploadState::Succeeded { file, case },
            Err(e) => {
                let message = e.user_message();
                self.error = Some(message.clone());
                UploadState::Failed { file, message }
            }
        };
        Ok(())
    }

    /// The upload was abandoned before the server answered. The file stays
    /// selected behind a `Failed` banner so it can be retried or cleared.
    pub fn cancel_submit(&mut self) {
        if let UploadState::Uploading(file) = &self.state {
            self.state = UploadState::Failed {
                file: file.clone(),
                message: UPLOAD_CANCELLED.to_string(),
            };
            self.error = Some(UPLOAD_CANCELLED.to_string());
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Case),
    Failed(String),
    /// Another submit is still running; nothing was sent
    AlreadyUploading,
}

/// Drives an [`UploadMachine`] against the repository
pub struct UploadController {
    repository: Arc<CaseRepository>,
    store: Store<UploadMachine>,
}

impl UploadController {
    pub fn new(repository: Arc<CaseRepository>) -> Self {
        Self::with_machine(repository, UploadMachine::default())
    }

    pub fn with_machine(repository: Arc<CaseRepository>, machine: UploadMachine) -> Self {
        Self {
            repository,
            store: Store::new(machine),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadMachine> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> UploadMachine {
        self.store.snapshot()
    }

    /// Stat `path` and select it. A missing file is reported like a rejected one.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> Result<(), WorkflowError> {
        match DumpFile::inspect(path).await {
            Ok(file) => self.store.update(|machine| machine.select_file(file)),
            Err(e) => self.store.update(|machine| {
                if machine.is_uploading() {
                    return Err(machine.invalid("select a file"));
                }
                machine.error = Some(e.to_string());
                Err(e.into())
            }),
        }
    }

    pub fn clear_error(&self) {
        self.store.update(UploadMachine::clear_error);
    }

    pub fn clear_selection(&self) -> Result<(), WorkflowError> {
        self.store.update(UploadMachine::clear_selection)
    }

    /// Upload the selected file. While an upload is running further calls
    /// return `AlreadyUploading` without touching the network.
    pub async fn submit(
        &self,
        name: &str,
        description: Option<&str>,
        priority: u8,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let begun = self
            .store
            .update(|machine| {
                if machine.is_uploading() {
                    return Ok(None);
                }
                machine.begin_submit(name, description, priority).map(Some)
            })?;
        let Some(request) = begun else {
            warn!("submit ignored: an upload is already in flight");
            return Ok(SubmitOutcome::AlreadyUploading);
        };

        let file_name = request.file.display().to_string();
        let in_flight = InFlight::new(&self.store, UploadMachine::cancel_submit);
        let result = self.repository.upload_case(request).await;
        in_flight.complete();
        let outcome = match &result {
            Ok(case) => {
                info!(case_id = %case.id, file = %file_name, "upload succeeded");
                SubmitOutcome::Created(case.clone())
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "upload failed");
                SubmitOutcome::Failed(e.user_message())
            }
        };
        self.store.update(|machine| machine.finish_submit(result))?;
        Ok(outcome)
    }
}
