//! Case domain model as exchanged with the analysis service

use crate::file_utils::{MAX_PRIORITY, MIN_PRIORITY};
use crate::utils::{deserialize_id, deserialize_optional_id, timestamp, timestamp_opt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Position of a case in the analysis pipeline.
/// Only the remote service moves a case between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [
        CaseStatus::Queued,
        CaseStatus::Processing,
        CaseStatus::Completed,
        CaseStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Queued => "queued",
            CaseStatus::Processing => "processing",
            CaseStatus::Completed => "completed",
            CaseStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are final
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Failed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown case status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for CaseStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Server-side status filter for listings; `All` sends no filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CaseStatus),
}

impl StatusFilter {
    /// Value for the `status` query parameter, if any
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.as_str()),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or("all"))
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// A submitted memory dump and its analysis outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: CaseStatus,
    #[serde(deserialize_with = "deserialize_priority")]
    pub priority: u8,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub files: Vec<CaseFile>,
}

impl Case {
    /// Filename the dump had on the submitting machine, if the server kept it
    pub fn original_filename(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get("original_filename"))
            .and_then(Value::as_str)
    }
}

/// A stored dump belonging to a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub case_id: Option<String>,
    pub file_path: String,
    pub file_size: u64,
    pub checksum: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(with = "timestamp")]
    pub stored_at: DateTime<Utc>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Progress snapshot of one case, as reported by `GET /{id}/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseProcessingStatus {
    #[serde(deserialize_with = "deserialize_id")]
    pub case_id: String,
    pub status: CaseStatus,
    /// Older backends omit this field; it then reads as 0
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub current_task: Option<String>,
    #[serde(default, with = "timestamp_opt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp_opt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Analysis report. `report_data` is engine-defined and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub case_id: String,
    pub status: Option<CaseStatus>,
    pub report_data: Value,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// One page of the case collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePage {
    pub cases: Vec<Case>,
    pub pagination: Pagination,
}

fn deserialize_priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let priority = i64::deserialize(deserializer)?;
    if (i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)).contains(&priority) {
        Ok(priority as u8)
    } else {
        Err(serde::de::Error::custom(format!(
            "priority {priority} outside {MIN_PRIORITY}..={MAX_PRIORITY}"
        )))
    }
}

fn deserialize_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    match Option::<i64>::deserialize(deserializer)? {
        None => Ok(0),
        Some(progress @ 0..=100) => Ok(progress as u8),
        Some(progress) => Err(serde::de::Error::custom(format!(
            "progress {progress} outside 0..=100"
        ))),
    }
}
