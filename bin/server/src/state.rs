//! Server application state management

use crate::constants::REPORT_SUMMARY;
use crate::pipeline::{Pipeline, Stage};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use common::utils::format_timestamp;
use common::{Case, CasePage, CaseProcessingStatus, CaseStatus, Pagination, ReportEnvelope};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Listing parameters after defaults and bounds are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub status: Option<CaseStatus>,
}

#[derive(Default)]
struct CaseStore {
    last_id: u64,
    cases: BTreeMap<u64, Case>,
}

/// In-memory case registry. Stored cases keep their creation-time status;
/// the pipeline stage is applied on every read.
pub struct AppState {
    data_dir: PathBuf,
    pipeline: Pipeline,
    store: Mutex<CaseStore>,
}

impl AppState {
    pub fn new(data_dir: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            data_dir: data_dir.into(),
            pipeline,
            store: Mutex::new(CaseStore::default()),
        }
    }

    /// Directory holding the dump of case `id`
    pub fn case_dir(&self, id: u64) -> PathBuf {
        self.data_dir.join(id.to_string())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Allocate the next sequential case id, starting at 1
    pub fn next_case_id(&self) -> Result<u64> {
        let mut store = self.lock()?;
        store.last_id += 1;
        Ok(store.last_id)
    }

    pub fn insert(&self, id: u64, case: Case) -> Result<()> {
        self.lock()?.cases.insert(id, case);
        Ok(())
    }

    pub fn case_count(&self) -> Result<usize> {
        Ok(self.lock()?.cases.len())
    }

    pub fn case(&self, id: u64, now: DateTime<Utc>) -> Result<Option<Case>> {
        let store = self.lock()?;
        Ok(store.cases.get(&id).map(|case| self.observe(case, now).0))
    }

    pub fn status(&self, id: u64, now: DateTime<Utc>) -> Result<Option<CaseProcessingStatus>> {
        let store = self.lock()?;
        Ok(store.cases.get(&id).map(|case| {
            let (case, stage) = self.observe(case, now);
            CaseProcessingStatus {
                case_id: case.id,
                status: stage.status,
                progress: stage.progress,
                current_task: stage.current_task,
                started_at: stage.started_at,
                completed_at: stage.completed_at,
                updated_at: Some(stage.updated_at),
            }
        }))
    }

    /// Placeholder report with the stored file's details
    pub fn report(&self, id: u64, now: DateTime<Utc>) -> Result<Option<ReportEnvelope>> {
        let store = self.lock()?;
        Ok(store.cases.get(&id).map(|case| {
            let (case, stage) = self.observe(case, now);
            let file = case.files.first();
            ReportEnvelope {
                case_id: case.id.clone(),
                status: Some(stage.status),
                report: json!({
                    "summary": REPORT_SUMMARY,
                    "analysis_date": now.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                    "file_info": {
                        "original_filename": case.original_filename().unwrap_or("unknown"),
                        "file_size": file.map_or(0, |f| f.file_size),
                        "checksum": file.map(|f| f.checksum.clone()),
                        "stored_at": file.map(|f| format_timestamp(&f.stored_at)),
                    },
                    "analysis": {
                        "indicators_found": 0,
                        "processes_analyzed": 0,
                        "network_connections": [],
                        "artifacts_found": []
                    }
                }),
                generated_at: None,
            }
        }))
    }

    /// Newest first, optionally restricted to one status
    pub fn list(&self, request: PageRequest, now: DateTime<Utc>) -> Result<CasePage> {
        let store = self.lock()?;
        let matching: Vec<Case> = store
            .cases
            .values()
            .rev()
            .map(|case| self.observe(case, now).0)
            .filter(|case| request.status.map_or(true, |status| case.status == status))
            .collect();

        let limit = request.limit.max(1);
        let page = request.page.max(1);
        let total = matching.len() as u64;
        let pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        let skip = usize::try_from((u64::from(page) - 1) * u64::from(limit)).unwrap_or(usize::MAX);

        Ok(CasePage {
            cases: matching
                .into_iter()
                .skip(skip)
                .take(limit as usize)
                .collect(),
            pagination: Pagination {
                page,
                limit,
                total,
                pages,
                has_next: page < pages,
                has_prev: page > 1,
            },
        })
    }

    fn observe(&self, case: &Case, now: DateTime<Utc>) -> (Case, Stage) {
        let dump_size = case.files.first().map_or(0, |file| file.file_size);
        let stage = self.pipeline.stage(case.created_at, now, dump_size);
        let mut case = case.clone();
        case.status = stage.status;
        case.updated_at = stage.updated_at;
        (case, stage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, CaseStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("Case store lock poisoned"))
    }
}
