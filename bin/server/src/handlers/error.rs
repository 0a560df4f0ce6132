use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use common::ErrorResponse;
use tracing::{error, warn};

/// Error whose response body is `{"error": message}`
pub fn json_error(status: StatusCode, body: ErrorResponse) -> actix_web::Error {
    let response = HttpResponse::build(status).json(&body);
    InternalError::from_response(body.error, response).into()
}

/// Helper function for bad request errors
pub fn handle_error(msg: &str) -> actix_web::Error {
    warn!("Rejected request: {}", msg);
    json_error(
        StatusCode::BAD_REQUEST,
        ErrorResponse {
            error: msg.to_string(),
            allowed_extensions: Vec::new(),
        },
    )
}

/// Helper function for server errors
pub fn handle_server_error<E: std::fmt::Display>(msg: &str, e: E) -> actix_web::Error {
    error!("{}: {}", msg, e);
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse {
            error: format!("{}: {}", msg, e),
            allowed_extensions: Vec::new(),
        },
    )
}

/// Helper function for not found errors
pub fn handle_not_found(case_id: &str) -> actix_web::Error {
    warn!(case_id = ?case_id, "Case not found");
    json_error(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "Case not found".to_string(),
            allowed_extensions: Vec::new(),
        },
    )
}
