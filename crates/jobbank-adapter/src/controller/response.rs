//! ActionError → HTTP response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use jobbank_usecase::ActionError;

/// Error half of every handler's `Result`
#[derive(Debug)]
pub struct ErrorResponse(pub ActionError);

impl From<ActionError> for ErrorResponse {
    fn from(err: ActionError) -> Self {
        ErrorResponse(err)
    }
}

impl ErrorResponse {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ActionError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ActionError::NotFound { .. } => StatusCode::NOT_FOUND,
            ActionError::ConcurrencyConflict { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ActionError::Store { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
