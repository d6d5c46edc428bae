pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::ingest::IngestService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::upload::upload_log,
        api::handlers::upload::upload_raw_log,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::upload::UploadResponse,
            api::handlers::upload::LogUploadForm,
            services::log_summary::LogSummary,
        )
    ),
    tags(
        (name = "system", description = "Service status"),
        (name = "logs", description = "Log file ingestion")
    ),
    info(
        title = "Log Analyzer API",
        description = "Upload log files and extract errors and warnings"
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub config: UploadConfig,
}

impl AppState {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            ingest: Arc::new(IngestService::new(&config)),
            config,
        }
    }
}

fn body_limit(config: &UploadConfig) -> DefaultBodyLimit {
    // Staged-size verification is authoritative; without an explicit ceiling
    // the transport must not cut bodies short at axum's 2 MB default.
    match config.transport_body_ceiling {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    }
}

fn cors_layer(config: &UploadConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::upload::upload_log)
                .layer(body_limit(&state.config))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::declared_size::guard_multipart_upload,
                )),
        )
        .route(
            "/upload/raw",
            post(api::handlers::upload::upload_raw_log)
                .layer(body_limit(&state.config))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::declared_size::guard_raw_upload,
                )),
        )
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(&api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
