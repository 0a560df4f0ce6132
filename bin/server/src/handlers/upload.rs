use crate::constants::DUMP_FILE_STEM;
use crate::handlers::error::{handle_error, handle_server_error, json_error};
use crate::handlers::upload_form::{FormError, UploadForm};
use crate::state::AppState;
use actix_multipart::form::MultipartForm;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use common::file_utils::ALLOWED_EXTENSIONS;
use common::{Case, CaseEnvelope, CaseFile, CaseStatus, ErrorResponse};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

/// Create a case from an uploaded dump (multipart/form-data)
#[post("/upload")]
pub async fn upload(
    form: MultipartForm<UploadForm>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let upload = form.into_inner().validate().map_err(|e| match e {
        FormError::InvalidFileType => json_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: e.message(),
                allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            },
        ),
        _ => handle_error(&e.message()),
    })?;

    // Structured logging with Debug formatter (?) escapes control characters
    info!(
        name = ?upload.name,
        filename = ?upload.original_filename,
        priority = upload.priority,
        "POST /api/cases/upload - Request received"
    );

    let case_id = state
        .next_case_id()
        .map_err(|e| handle_server_error("Failed to allocate case id", e))?;
    let case_dir = state.case_dir(case_id);
    let dump_path = case_dir.join(format!("{}.{}", DUMP_FILE_STEM, upload.extension));

    tokio::fs::create_dir_all(&case_dir)
        .await
        .map_err(|e| handle_server_error("Failed to create case directory", e))?;
    let file_size = tokio::fs::copy(upload.file.file.path(), &dump_path)
        .await
        .map_err(|e| handle_server_error("Failed to store dump", e))?;

    let checksum_path = dump_path.clone();
    let checksum = web::block(move || sha256_file(&checksum_path))
        .await
        .map_err(|e| handle_server_error("Checksum task failed", e))?
        .map_err(|e| handle_server_error("Failed to checksum dump", e))?;

    let now = Utc::now();
    let mut metadata = Map::new();
    metadata.insert(
        "original_filename".to_string(),
        Value::String(upload.original_filename.clone()),
    );

    let case = Case {
        id: case_id.to_string(),
        name: upload.name,
        description: Some(upload.description),
        status: CaseStatus::Queued,
        priority: upload.priority,
        created_at: now,
        updated_at: now,
        metadata: Some(metadata),
        files: vec![CaseFile {
            id: Some(case_id.to_string()),
            case_id: Some(case_id.to_string()),
            file_path: dump_path.display().to_string(),
            file_size,
            checksum,
            mime_type: upload
                .file
                .content_type
                .as_ref()
                .map(|mime| mime.to_string())
                .or_else(|| Some("application/octet-stream".to_string())),
            stored_at: now,
            report_path: None,
            notes: Some(format!("Original filename: {}", upload.original_filename)),
        }],
    };

    state
        .insert(case_id, case.clone())
        .map_err(|e| handle_server_error("Failed to record case", e))?;

    info!(
        case_id,
        file_size,
        path = ?dump_path,
        "POST /api/cases/upload - Case created"
    );

    Ok(HttpResponse::Created().json(CaseEnvelope {
        case,
        message: Some("Case created successfully".to_string()),
    }))
}

/// Hex SHA-256 of a file, streamed
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
