//! Case repository: the only gateway between domain code and the case service.
//!
//! Owns URL construction and response parsing. Holds no cache; every call
//! is a fresh round trip through the injected [`Transport`].

pub mod error;

use common::file_utils::{self, DEFAULT_PRIORITY};
use common::{
    Case, CaseEnvelope, CasePage, CaseProcessingStatus, CaseReport, ReportEnvelope, StatusFilter,
};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use transport::{HttpRequest, HttpResponse, MultipartUpload, Transport};

pub use error::CaseError;

/// API prefix of the case endpoints
pub const CASES_BASE_PATH: &str = "/api/cases";

/// MIME type sent for every dump
pub const DUMP_MIME_TYPE: &str = "application/octet-stream";

/// Input for [`CaseRepository::upload_case`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub file: PathBuf,
    pub name: String,
    pub description: Option<String>,
    pub priority: u8,
}

impl NewCase {
    pub fn new(file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            description: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// Page and filter of a listing request. Values are sent as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub status: StatusFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: StatusFilter::All,
        }
    }
}

pub struct CaseRepository {
    transport: Arc<dyn Transport>,
    base_path: String,
}

impl CaseRepository {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_path: CASES_BASE_PATH.to_string(),
        }
    }

    /// Override the API prefix (default `/api/cases`)
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a case by uploading one dump.
    /// Extension, name and priority are checked before any request is made.
    pub async fn upload_case(&self, new_case: NewCase) -> Result<Case, CaseError> {
        let file_name = file_utils::validate_dump_path(&new_case.file)?;
        let name = file_utils::validate_case_name(&new_case.name)?;
        let priority = file_utils::validate_priority(i64::from(new_case.priority))?;

        let mut fields = vec![("name".to_string(), name.clone())];
        if let Some(description) = new_case.description.filter(|d| !d.trim().is_empty()) {
            fields.push(("description".to_string(), description));
        }
        fields.push(("priority".to_string(), priority.to_string()));

        let upload = MultipartUpload {
            file_path: new_case.file,
            file_name: file_name.clone(),
            mime_type: DUMP_MIME_TYPE.to_string(),
            fields,
        };

        debug!(file = %file_name, name = %name, priority, "uploading case");
        let response = self
            .transport
            .send(HttpRequest::multipart(self.path("/upload"), upload))
            .await?;
        check_status(&response, None)?;

        let envelope: CaseEnvelope = parse_body(&response)?;
        info!(case_id = %envelope.case.id, status = %envelope.case.status, "case created");
        Ok(envelope.case)
    }

    pub async fn get_case(&self, case_id: &str) -> Result<Case, CaseError> {
        let case_id = file_utils::validate_case_id(case_id)?;
        let response = self
            .transport
            .send(HttpRequest::get(self.path(&format!("/{case_id}"))))
            .await?;
        check_status(&response, Some(case_id))?;
        let envelope: CaseEnvelope = parse_body(&response)?;
        Ok(envelope.case)
    }

    /// Current processing status. A payload without `progress` reads as 0%.
    pub async fn get_case_status(&self, case_id: &str) -> Result<CaseProcessingStatus, CaseError> {
        let case_id = file_utils::validate_case_id(case_id)?;
        let response = self
            .transport
            .send(HttpRequest::get(self.path(&format!("/{case_id}/status"))))
            .await?;
        check_status(&response, Some(case_id))?;
        parse_body(&response)
    }

    /// Analysis report; the report body is not inspected
    pub async fn get_case_report(&self, case_id: &str) -> Result<CaseReport, CaseError> {
        let case_id = file_utils::validate_case_id(case_id)?;
        let response = self
            .transport
            .send(HttpRequest::get(self.path(&format!("/{case_id}/report"))))
            .await?;
        check_status(&response, Some(case_id))?;
        let envelope: ReportEnvelope = parse_body(&response)?;
        Ok(envelope.into())
    }

    pub async fn list_cases(&self, query: &ListQuery) -> Result<CasePage, CaseError> {
        let mut request = HttpRequest::get(self.path("/"))
            .with_query("page", query.page)
            .with_query("limit", query.limit);
        if let Some(status) = query.status.query_value() {
            request = request.with_query("status", status);
        }

        let response = self.transport.send(request).await?;
        check_status(&response, None)?;
        let page: CasePage = parse_body(&response)?;
        debug!(
            page = page.pagination.page,
            total = page.pagination.total,
            returned = page.cases.len(),
            "listed cases"
        );
        Ok(page)
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.base_path, suffix)
    }
}

/// 404 on a case lookup is `NotFound`; anything else >= 400 is `Remote`
fn check_status(response: &HttpResponse, case_id: Option<&str>) -> Result<(), CaseError> {
    match (response.status, case_id) {
        (404, Some(case_id)) => {
            warn!(case_id, "case not found");
            Err(CaseError::NotFound(case_id.to_string()))
        }
        (status, _) if status >= 400 => {
            warn!(status, body = %response.body, "request rejected by server");
            Err(CaseError::Remote {
                status_code: status,
                body: response.body.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, CaseError> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(error = %e, "malformed response body");
        CaseError::Parse(e.to_string())
    })
}
