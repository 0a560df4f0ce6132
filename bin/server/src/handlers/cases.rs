use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::handlers::error::{handle_error, handle_not_found, handle_server_error};
use crate::state::{AppState, PageRequest};
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use common::{CaseEnvelope, StatusFilter};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

impl ListParams {
    fn page_request(&self) -> Result<PageRequest, String> {
        let status = match self.status.as_deref() {
            None | Some("") => StatusFilter::All,
            Some(raw) => raw
                .parse::<StatusFilter>()
                .map_err(|_| format!("Invalid status filter: {raw}"))?,
        };
        Ok(PageRequest {
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            status: match status {
                StatusFilter::All => None,
                StatusFilter::Only(status) => Some(status),
            },
        })
    }
}

/// Ids are integers; anything else can never name a case
fn parse_case_id(raw: &str) -> ActixResult<u64> {
    raw.parse().map_err(|_| handle_not_found(raw))
}

/// List cases, newest first
#[get("/")]
pub async fn list_cases(
    query: web::Query<ListParams>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let request = query.page_request().map_err(|e| handle_error(&e))?;
    let page = state
        .list(request, Utc::now())
        .map_err(|e| handle_server_error("Failed to list cases", e))?;

    info!(
        page = page.pagination.page,
        limit = page.pagination.limit,
        total = page.pagination.total,
        "GET /api/cases/"
    );
    Ok(HttpResponse::Ok().json(page))
}

#[get("/{case_id}")]
pub async fn get_case(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let case_id = parse_case_id(&path)?;
    let case = state
        .case(case_id, Utc::now())
        .map_err(|e| handle_server_error("Failed to load case", e))?
        .ok_or_else(|| handle_not_found(&path))?;
    Ok(HttpResponse::Ok().json(CaseEnvelope {
        case,
        message: None,
    }))
}

#[get("/{case_id}/status")]
pub async fn get_case_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let case_id = parse_case_id(&path)?;
    let status = state
        .status(case_id, Utc::now())
        .map_err(|e| handle_server_error("Failed to load case status", e))?
        .ok_or_else(|| handle_not_found(&path))?;
    Ok(HttpResponse::Ok().json(status))
}

#[get("/{case_id}/report")]
pub async fn get_case_report(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let case_id = parse_case_id(&path)?;
    let report = state
        .report(case_id, Utc::now())
        .map_err(|e| handle_server_error("Failed to build report", e))?
        .ok_or_else(|| handle_not_found(&path))?;
    Ok(HttpResponse::Ok().json(report))
}
