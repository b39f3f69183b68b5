//! HTTP front end for the classifier.
//!
//! `GET /` answers a liveness string, `POST /predict` takes a multipart upload
//! with a `file` field and returns `{"prediction": "Cat"|"Dog", "confidence": f}`.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{read_upload, Upload, ROOT_MESSAGE, UPLOAD_FIELD};
pub use state::{AppState, SharedState};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::Classifier;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://dog-vs-cat-classifier-py-torch.vercel.app";
pub const DEFAULT_MODEL_PATH: &str = "dog_cat_model.safetensors";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Single origin allowed by CORS, or `*`.
    pub allowed_origin: String,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

/// Load the model, then serve until ctrl+c.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = std::time::Instant::now();

    let model_path = config.model_path.clone();
    let classifier = tokio::task::spawn_blocking(move || Classifier::load(&model_path))
        .await?
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;

    info!(
        model = %config.model_path.display(),
        layers = classifier.model().num_layers(),
        load_ms = start_time.elapsed().as_millis() as u64,
        "Model loaded"
    );
    tracing::debug!("\n{}", classifier.model().summary());

    let state = Arc::new(AppState::new(config.clone(), classifier));
    let app = create_router(state)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        address = %addr,
        allowed_origin = %config.allowed_origin,
        max_upload_size = config.max_upload_size,
        pid = std::process::id(),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(uptime_secs = start_time.elapsed().as_secs(), "Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server gracefully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 10000);
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
    }
}
