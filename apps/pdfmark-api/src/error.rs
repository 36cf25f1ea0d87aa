//! Error types for the pdfmark API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfmark_core::PdfMarkError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session limit of {0} reached")]
    TooManySessions(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Page rendering is not available on this server")]
    RenderUnavailable,

    #[error(transparent)]
    Pdf(#[from] PdfMarkError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

fn pdf_status(err: &PdfMarkError) -> (StatusCode, &'static str) {
    match err {
        PdfMarkError::DocumentLoad(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_LOAD"),
        PdfMarkError::InvalidPageIndex { .. } => (StatusCode::BAD_REQUEST, "INVALID_PAGE_INDEX"),
        PdfMarkError::NoDocument => (StatusCode::CONFLICT, "NO_DOCUMENT"),
        PdfMarkError::ToolMismatch { .. } => (StatusCode::BAD_REQUEST, "TOOL_MISMATCH"),
        PdfMarkError::InvalidStroke(_) => (StatusCode::BAD_REQUEST, "INVALID_STROKE"),
        PdfMarkError::InvalidCoordinate(_) => (StatusCode::BAD_REQUEST, "INVALID_COORDINATE"),
        PdfMarkError::InvalidColor(_) => (StatusCode::BAD_REQUEST, "INVALID_COLOR"),
        PdfMarkError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "INVALID_QUERY"),
        PdfMarkError::InvalidScale(_) => (StatusCode::BAD_REQUEST, "INVALID_SCALE"),
        PdfMarkError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
        PdfMarkError::Save(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SAVE_FAILED"),
        PdfMarkError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED"),
        PdfMarkError::Operation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "OPERATION_FAILED"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ApiError::TooManySessions(_) => (StatusCode::SERVICE_UNAVAILABLE, "TOO_MANY_SESSIONS"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::RenderUnavailable => (StatusCode::NOT_IMPLEMENTED, "RENDER_UNAVAILABLE"),
            ApiError::Pdf(err) => pdf_status(err),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
            code,
        });
        (status, body).into_response()
    }
}
