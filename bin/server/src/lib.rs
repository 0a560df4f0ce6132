//! Reference case service: the case API backed by an in-memory registry
//! and a simulated analysis pipeline.

pub mod config;
pub mod constants;
pub mod handlers;
pub mod pipeline;
pub mod state;

use actix_multipart::form::MultipartFormConfig;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use constants::{CASES_SCOPE, MAX_FORM_MEMORY, MAX_UPLOAD_SIZE};
use state::AppState;
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::error;

/// Register every route and the multipart limits
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(usize::try_from(MAX_UPLOAD_SIZE).unwrap_or(usize::MAX))
            .memory_limit(MAX_FORM_MEMORY)
            .error_handler(|e, _req| handlers::error::handle_error(&format!("Invalid upload form: {e}"))),
    )
    .service(handlers::health::health)
    .service(
        web::scope(CASES_SCOPE)
            .service(handlers::upload::upload)
            .service(handlers::cases::list_cases)
            .service(handlers::cases::get_case_status)
            .service(handlers::cases::get_case_report)
            .service(handlers::cases::get_case),
    );
}

/// Bind the service; port 0 picks a free port. Returns the server future
/// and the addresses it listens on.
pub fn bind(
    state: web::Data<AppState>,
    address: impl ToSocketAddrs,
) -> std::io::Result<(Server, Vec<SocketAddr>)> {
    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .workers(1)
        .bind(address)
        .map_err(|e| {
            error!("Failed to bind: {}", e);
            e
        })?;
    let addresses = server.addrs();
    Ok((server.run(), addresses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use common::{CasePage, ErrorResponse, HealthResponse};
    use pipeline::Pipeline;
    use std::time::Duration;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            std::env::temp_dir().join("case-service-tests"),
            Pipeline::new(Duration::from_secs(5), Duration::from_secs(30)),
        ))
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let response: HealthResponse =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(response.status, "ok");
    }

    #[actix_web::test]
    async fn test_unknown_case_is_json_404() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        for uri in ["/api/cases/42", "/api/cases/42/status", "/api/cases/42/report", "/api/cases/abc"] {
            let response =
                test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let body: ErrorResponse = test::read_body_json(response).await;
            assert_eq!(body.error, "Case not found");
        }
    }

    #[actix_web::test]
    async fn test_empty_listing() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let page: CasePage = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/cases/?page=2&limit=5").to_request(),
        )
        .await;
        assert!(page.cases.is_empty());
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.limit, 5);
        assert_eq!(page.pagination.total, 0);
        assert!(page.pagination.has_prev);
    }

    #[actix_web::test]
    async fn test_bad_status_filter() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/cases/?status=archived").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
