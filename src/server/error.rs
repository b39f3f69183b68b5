//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Uploaded file is too large")]
    PayloadTooLarge,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::Error> for ServerError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Decode(inner) => ServerError::InvalidImage(inner.to_string()),
            err @ crate::Error::EmptyImage { .. } => ServerError::InvalidImage(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingFile
            | ServerError::InvalidImage(_)
            | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                "An internal error occurred".to_string()
            }
            other => {
                tracing::warn!(status = status.as_u16(), error = %other, "Rejected request");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
