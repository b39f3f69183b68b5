//! API route definitions

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::SharedState};

async fn handle_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = if allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(allowed_origin)
            .with_context(|| format!("invalid CORS origin {:?}", allowed_origin))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Create the application router
pub fn create_router(state: SharedState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.allowed_origin)?;
    let max_upload_size = state.config.max_upload_size;

    let router = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route("/predict", post(handlers::predict))
        .fallback(handle_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
