use crate::AppState;
use crate::api::error::AppError;
use crate::services::ingest::{DeclaredSize, IngestOutcome};
use crate::services::log_summary::LogSummary;
use crate::utils::filename::{FALLBACK_FILENAME, sanitize_filename};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub upload_id: String,
    pub filename: String,
    /// Measured size in bytes
    pub size: u64,
    /// Declared `Content-Length` (raw uploads only)
    pub declared_size: Option<u64>,
    pub size_mismatch: bool,
    pub staged_on_disk: bool,
    pub summary: LogSummary,
}

/// Multipart form accepted by `/upload`.
#[derive(ToSchema)]
pub struct LogUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RawUploadQuery {
    /// Name reported back in the response
    pub filename: Option<String>,
}

impl UploadResponse {
    fn new(
        filename: String,
        declared_size: Option<u64>,
        outcome: IngestOutcome<LogSummary>,
    ) -> Self {
        let size_mismatch = declared_size.is_some_and(|d| d != outcome.size);
        if size_mismatch {
            tracing::warn!(
                "Declared size {:?} does not match measured size {} for upload {}",
                declared_size,
                outcome.size,
                outcome.upload_id
            );
        }

        tracing::info!(
            "✅ Ingested {} ({} bytes, on_disk={}): {} lines, {} errors, {} warnings",
            filename,
            outcome.size,
            outcome.staged_on_disk,
            outcome.value.lines,
            outcome.value.errors,
            outcome.value.warnings
        );

        Self {
            upload_id: outcome.upload_id.to_string(),
            filename,
            size: outcome.size,
            declared_size,
            size_mismatch,
            staged_on_disk: outcome.staged_on_disk,
            summary: outcome.value,
        }
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = LogUploadForm, content_type = "multipart/form-data", description = "Log file upload"),
    responses(
        (status = 200, description = "Log file ingested", body = UploadResponse),
        (status = 400, description = "Malformed form or missing file"),
        (status = 413, description = "File exceeds the upload size limit")
    ),
    tag = "logs"
)]
pub async fn upload_log(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut response = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if response.is_some() {
            return Err(AppError::BadRequest(
                "Only one file may be uploaded per request".to_string(),
            ));
        }

        let filename = sanitize_filename(field.file_name().unwrap_or(FALLBACK_FILENAME));
        tracing::info!("📥 Receiving log file {}", filename);

        let outcome = state
            .ingest
            .ingest(field, |upload| LogSummary::scan(upload))
            .await?;

        // Content-Length covers the whole envelope here, so no mismatch check
        response = Some(UploadResponse::new(filename, None, outcome));
    }

    response
        .map(Json)
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))
}

#[utoipa::path(
    post,
    path = "/upload/raw",
    request_body(content = Vec<u8>, description = "Log file contents", content_type = "application/octet-stream"),
    params(RawUploadQuery),
    responses(
        (status = 200, description = "Log file ingested", body = UploadResponse),
        (status = 400, description = "Body could not be read"),
        (status = 413, description = "File exceeds the upload size limit")
    ),
    tag = "logs"
)]
pub async fn upload_raw_log(
    State(state): State<AppState>,
    Query(query): Query<RawUploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, AppError> {
    let filename = sanitize_filename(query.filename.as_deref().unwrap_or(FALLBACK_FILENAME));
    let declared = DeclaredSize::from_headers(&headers);
    tracing::info!("📥 Receiving raw log file {}", filename);

    let outcome = state
        .ingest
        .ingest(body.into_data_stream(), |upload| LogSummary::scan(upload))
        .await?;

    Ok(Json(UploadResponse::new(filename, declared.bytes(), outcome)))
}
