use crate::AppState;
use crate::api::error::AppError;
use crate::services::ingest::{BodyEncoding, DeclaredSize};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

async fn enforce(
    state: &AppState,
    req: Request,
    next: Next,
    encoding: BodyEncoding,
) -> Result<Response, AppError> {
    let declared = DeclaredSize::from_headers(req.headers());
    state.ingest.guard(&declared, encoding)?;

    if let DeclaredSize::Bytes(n) = declared {
        tracing::debug!("Declared size {} bytes passed the guard", n);
    }

    Ok(next.run(req).await)
}

/// Declared-size guard for routes whose body is the file itself.
pub async fn guard_raw_upload(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, req, next, BodyEncoding::Raw).await
}

/// Declared-size guard for `multipart/form-data` routes.
pub async fn guard_multipart_upload(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, req, next, BodyEncoding::Multipart).await
}
