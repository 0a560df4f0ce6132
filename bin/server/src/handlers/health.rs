use crate::handlers::error::handle_server_error;
use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use tracing::debug;

/// Health check endpoint; fails once the case store is unusable
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let cases = state
        .case_count()
        .map_err(|e| handle_server_error("Case store unavailable", e))?;
    debug!(cases, "GET /health");
    Ok(HttpResponse::Ok().json(common::HealthResponse {
        status: "ok".to_string(),
    }))
}
