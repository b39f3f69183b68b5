//! Application state shared across handlers

use std::sync::Arc;
use std::time::Instant;

use crate::Classifier;

use super::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    /// Loaded once before the listener binds; read-only afterwards.
    pub classifier: Arc<Classifier>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, classifier: Classifier) -> Self {
        Self {
            config,
            classifier: Arc::new(classifier),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
