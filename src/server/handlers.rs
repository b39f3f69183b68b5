use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::Prediction;

use super::error::{Result, ServerError};
use super::state::SharedState;

/// Multipart field that carries the image.
pub const UPLOAD_FIELD: &str = "file";

pub const ROOT_MESSAGE: &str = "Dog vs Cat Classifier API is running";

/// An image payload pulled out of a multipart request.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

/// Find the `file` part, skipping other fields.
///
/// Only a part that carries a filename counts as an upload; a plain text field
/// named `file` is skipped like any other form value.
pub async fn read_upload(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Skipping `file` form value without a filename");
            continue;
        };

        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { file_name, bytes });
    }

    Err(ServerError::MissingFile)
}

/// GET / - liveness message
pub async fn home() -> &'static str {
    ROOT_MESSAGE
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub model: String,
    pub layers: usize,
}

/// GET /health
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model = state.classifier.model();
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model.name().to_string(),
        layers: model.num_layers(),
    })
}

/// POST /predict - classify the uploaded image
pub async fn predict(
    State(state): State<SharedState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>> {
    // A body that isn't multipart at all has no file either.
    let mut multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection, "Request body is not multipart");
        ServerError::MissingFile
    })?;

    let Upload { file_name, bytes } = read_upload(&mut multipart).await?;
    let size = bytes.len();
    let start = Instant::now();

    let classifier = Arc::clone(&state.classifier);
    let prediction = tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes))
        .await
        .map_err(|e| ServerError::Internal(format!("inference task failed: {}", e)))??;

    info!(
        file = %file_name,
        bytes = size,
        prediction = %prediction.label,
        confidence = prediction.confidence,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Prediction served"
    );

    Ok(Json(prediction))
}
