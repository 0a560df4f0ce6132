//! Simulated analysis pipeline.
//!
//! Nothing runs in the background. The stage of a case is derived from its
//! age each time it is read: queued, then processing with linear progress,
//! then completed. An empty dump fails as soon as processing would start.

use crate::constants::PIPELINE_TASKS;
use chrono::{DateTime, Utc};
use common::CaseStatus;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    queue: Duration,
    processing: Duration,
}

/// Where a case stands at a given instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub status: CaseStatus,
    pub progress: u8,
    pub current_task: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(queue: Duration, processing: Duration) -> Self {
        Self { queue, processing }
    }

    pub fn queue(&self) -> Duration {
        self.queue
    }

    pub fn processing(&self) -> Duration {
        self.processing
    }

    pub fn stage(&self, created_at: DateTime<Utc>, now: DateTime<Utc>, dump_size: u64) -> Stage {
        let elapsed = (now - created_at).to_std().unwrap_or(Duration::ZERO);
        let started_at = offset(created_at, self.queue);

        if elapsed < self.queue {
            return Stage {
                status: CaseStatus::Queued,
                progress: 0,
                current_task: Some("Waiting for an analysis worker".to_string()),
                started_at: None,
                completed_at: None,
                updated_at: created_at,
            };
        }

        if dump_size == 0 {
            return Stage {
                status: CaseStatus::Failed,
                progress: 0,
                current_task: Some("Dump file is empty".to_string()),
                started_at: Some(started_at),
                completed_at: Some(started_at),
                updated_at: started_at,
            };
        }

        let running = elapsed - self.queue;
        if running < self.processing {
            let progress = (running.as_millis() * 100 / self.processing.as_millis().max(1)) as u8;
            let task = PIPELINE_TASKS[usize::from(progress) * PIPELINE_TASKS.len() / 100];
            return Stage {
                status: CaseStatus::Processing,
                progress,
                current_task: Some(task.to_string()),
                started_at: Some(started_at),
                completed_at: None,
                updated_at: now,
            };
        }

        let completed_at = offset(started_at, self.processing);
        Stage {
            status: CaseStatus::Completed,
            progress: 100,
            current_task: None,
            started_at: Some(started_at),
            completed_at: Some(completed_at),
            updated_at: completed_at,
        }
    }
}

fn offset(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|duration| at.checked_add_signed(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
