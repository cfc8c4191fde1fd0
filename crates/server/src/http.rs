//! HTTP transport.
//!
//! `POST /emotion` takes a multipart form with the image in the `file`
//! field. Success answers 200 with `{emotion, songs}`; every failure answers
//! 500 with `{error, details}`.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use model::{PipelineError, RecommendationResponse};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::orchestrator::RequestOrchestrator;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<RequestOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: RequestOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Build the application router.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/emotion", post(process_emotion))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn process_emotion(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let response = match read_upload(multipart).await {
        Ok(upload) => state.orchestrator.handle_request(upload).await,
        Err(e) => state.orchestrator.fail(e),
    };
    into_http(response)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Pull the bytes of the `file` field out of the form.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, PipelineError> {
    let mut multipart = multipart.map_err(|e| PipelineError::Validation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Validation(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring form field {:?}", field.name());
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::Validation(e.body_text()))?;
        return Ok(bytes.to_vec());
    }

    Err(PipelineError::Validation(format!(
        "missing '{}' field",
        UPLOAD_FIELD
    )))
}

fn into_http(response: RecommendationResponse) -> Response {
    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response)).into_response()
}
