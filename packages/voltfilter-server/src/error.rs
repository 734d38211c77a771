use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};
use voltfilter_rs::PipelineError;

/// Errors returned by the upload endpoint
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file part in request")]
    NoFilePart,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File too large. Maximum size: {0} bytes")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFilePart | ApiError::NoFileSelected => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response body
    pub fn message(&self) -> String {
        if self.status().is_server_error() {
            format!("An unexpected error occurred: {}", self)
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!("Upload failed: {}", message);
        } else {
            warn!("Upload rejected ({}): {}", status.as_u16(), message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
