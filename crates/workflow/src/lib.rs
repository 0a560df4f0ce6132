//! Screen-level state machines for the case lifecycle.
//!
//! Each machine is a plain value with synchronous transition methods, so
//! every transition can be tested without I/O. A controller wraps a machine,
//! runs the repository calls a transition asks for, and publishes a fresh
//! snapshot to subscribers after every change.

pub mod listing;
pub mod operations;
pub mod upload;

use common::ValidationError;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

pub use listing::{
    ApplyResult, Listing, ListingController, ListingCounters, ListingRequest, ListingView,
    RefreshOutcome, DEFAULT_ITEMS_PER_PAGE,
};
pub use operations::{
    CaseOperations, CaseOperationsController, FetchKind, FetchOutcome, FetchSlot,
};
pub use upload::{
    DumpFile, SubmitOutcome, UploadController, UploadMachine, UploadState, UPLOAD_CANCELLED,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Privately owned machine plus the channel its snapshots are published on
pub(crate) struct Store<M: Clone> {
    machine: Mutex<M>,
    updates: watch::Sender<M>,
}

impl<M: Clone> Store<M> {
    pub(crate) fn new(machine: M) -> Self {
        let (updates, _) = watch::channel(machine.clone());
        Self {
            machine: Mutex::new(machine),
            updates,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<M> {
        self.updates.subscribe()
    }

    pub(crate) fn snapshot(&self) -> M {
        self.lock().clone()
    }

    /// Apply a transition and notify subscribers. The lock is never held
    /// across an await, so callers run repository calls between updates.
    pub(crate) fn update<R>(&self, transition: impl FnOnce(&mut M) -> R) -> R {
        let mut machine = self.lock();
        let result = transition(&mut machine);
        self.updates.send_replace(machine.clone());
        result
    }

    fn lock(&self) -> MutexGuard<'_, M> {
        // Transitions never panic midway, so a poisoned machine is still consistent
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Undoes an in-flight mark when the future that set it is dropped before
/// the repository call returns.
pub(crate) struct InFlight<'a, M: Clone, F: FnOnce(&mut M)> {
    store: &'a Store<M>,
    cancel: Option<F>,
}

impl<'a, M: Clone, F: FnOnce(&mut M)> InFlight<'a, M, F> {
    pub(crate) fn new(store: &'a Store<M>, cancel: F) -> Self {
        Self {
            store,
            cancel: Some(cancel),
        }
    }

    /// The call returned; its outcome is recorded by the caller instead
    pub(crate) fn complete(mut self) {
        self.cancel = None;
    }
}

impl<M: Clone, F: FnOnce(&mut M)> Drop for InFlight<'_, M, F> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            self.store.update(cancel);
        }
    }
}
