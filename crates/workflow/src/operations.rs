//! Per-case operations: details, status and report fetches.
//!
//! The three kinds are independent. Each has its own loading flag, error
//! and last result, so a failing report fetch leaves a loaded status intact.

use crate::{InFlight, Store};
use common::{Case, CaseProcessingStatus, CaseReport};
use repository::{CaseError, CaseRepository};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Details,
    Status,
    Report,
}

impl FetchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchKind::Details => "details",
            FetchKind::Status => "status",
            FetchKind::Report => "report",
        }
    }
}

/// Loading flag, error and last good result of one fetch kind
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSlot<T> {
    is_loading: bool,
    error: Option<String>,
    last_result: Option<T>,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self {
            is_loading: false,
            error: None,
            last_result: None,
        }
    }
}

impl<T> FetchSlot<T> {
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_result(&self) -> Option<&T> {
        self.last_result.as_ref()
    }

    /// Returns false if a fetch of this kind is already running
    pub fn begin(&mut self) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        self.error = None;
        true
    }

    pub fn succeed(&mut self, value: T) {
        self.is_loading = false;
        self.last_result = Some(value);
    }

    /// The previous result stays visible next to the error
    pub fn fail(&mut self, message: String) {
        self.is_loading = false;
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The fetch was abandoned before it returned; the previous result stays
    pub fn cancel(&mut self) {
        self.is_loading = false;
    }
}

/// Operation state for one case id
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOperations {
    case_id: String,
    pub details: FetchSlot<Case>,
    pub status: FetchSlot<CaseProcessingStatus>,
    pub report: FetchSlot<CaseReport>,
}

impl CaseOperations {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            details: FetchSlot::default(),
            status: FetchSlot::default(),
            report: FetchSlot::default(),
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn is_loading(&self, kind: FetchKind) -> bool {
        match kind {
            FetchKind::Details => self.details.is_loading(),
            FetchKind::Status => self.status.is_loading(),
            FetchKind::Report => self.report.is_loading(),
        }
    }

    pub fn error(&self, kind: FetchKind) -> Option<&str> {
        match kind {
            FetchKind::Details => self.details.error(),
            FetchKind::Status => self.status.error(),
            FetchKind::Report => self.report.error(),
        }
    }

    pub fn clear_error(&mut self, kind: FetchKind) {
        match kind {
            FetchKind::Details => self.details.clear_error(),
            FetchKind::Status => self.status.clear_error(),
            FetchKind::Report => self.report.clear_error(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Loaded(T),
    Failed(String),
    /// Same kind already in flight; nothing was sent
    AlreadyLoading,
}

pub struct CaseOperationsController {
    repository: Arc<CaseRepository>,
    store: Store<CaseOperations>,
}

impl CaseOperationsController {
    pub fn new(repository: Arc<CaseRepository>, case_id: impl Into<String>) -> Self {
        Self {
            repository,
            store: Store::new(CaseOperations::new(case_id)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CaseOperations> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> CaseOperations {
        self.store.snapshot()
    }

    pub async fn fetch_details(&self) -> FetchOutcome<Case> {
        let repository = self.repository.clone();
        self.fetch(
            FetchKind::Details,
            |ops| &mut ops.details,
            |id| async move { repository.get_case(&id).await },
        )
        .await
    }

    pub async fn fetch_status(&self) -> FetchOutcome<CaseProcessingStatus> {
        let repository = self.repository.clone();
        self.fetch(
            FetchKind::Status,
            |ops| &mut ops.status,
            |id| async move { repository.get_case_status(&id).await },
        )
        .await
    }

    pub async fn fetch_report(&self) -> FetchOutcome<CaseReport> {
        let repository = self.repository.clone();
        self.fetch(
            FetchKind::Report,
            |ops| &mut ops.report,
            |id| async move { repository.get_case_report(&id).await },
        )
        .await
    }

    pub fn clear_error(&self, kind: FetchKind) {
        self.store.update(|ops| ops.clear_error(kind));
    }

    async fn fetch<T, F, Fut>(
        &self,
        kind: FetchKind,
        slot: fn(&mut CaseOperations) -> &mut FetchSlot<T>,
        call: F,
    ) -> FetchOutcome<T>
    where
        T: Clone,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, CaseError>>,
    {
        let started = self.store.update(|ops| {
            let case_id = ops.case_id.clone();
            slot(ops).begin().then_some(case_id)
        });
        let Some(case_id) = started else {
            debug!(kind = kind.as_str(), "fetch already in flight");
            return FetchOutcome::AlreadyLoading;
        };

        let in_flight = InFlight::new(&self.store, move |ops: &mut CaseOperations| {
            slot(ops).cancel()
        });
        let result = call(case_id.clone()).await;
        in_flight.complete();

        match result {
            Ok(value) => {
                self.store.update(|ops| slot(ops).succeed(value.clone()));
                FetchOutcome::Loaded(value)
            }
            Err(e) => {
                if e.is_not_found() {
                    debug!(case_id = %case_id, kind = kind.as_str(), "case not found");
                } else {
                    warn!(case_id = %case_id, kind = kind.as_str(), error = %e, "fetch failed");
                }
                let message = e.user_message();
                self.store.update(|ops| slot(ops).fail(message.clone()));
                FetchOutcome::Failed(message)
            }
        }
    }
}
