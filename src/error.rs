use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::render;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("OCR engine failed: {0}")]
    EngineError(String),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::DecodeError(_) => "DECODE_ERROR",
            OcrError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            OcrError::PreprocessingError(_) => "PREPROCESSING_ERROR",
            OcrError::EngineError(_) => "ENGINE_ERROR",
            OcrError::Database(_) => "DATABASE_ERROR",
            OcrError::Staging(_) => "STAGING_ERROR",
            OcrError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            OcrError::MissingFile => "MISSING_FILE",
            OcrError::InvalidRequest(_) => "INVALID_REQUEST",
            OcrError::Config(_) => "CONFIG_ERROR",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            OcrError::UnsupportedFormat(_)
            | OcrError::DecodeError(_)
            | OcrError::MissingFile
            | OcrError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OcrError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(code = self.code(), "Request rejected: {}", self);
        (status, render::error_page(&self.to_string(), self.code())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_map_to_client_status() {
        assert_eq!(OcrError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            OcrError::ImageTooLarge { size: 10, max: 5 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            OcrError::EngineError("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message_includes_limits() {
        let err = OcrError::ImageTooLarge { size: 10, max: 5 };
        assert_eq!(err.to_string(), "Image too large: 10 bytes (max: 5 bytes)");
        assert_eq!(err.code(), "IMAGE_TOO_LARGE");
    }
}
