//! API error types and their wire envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fraudgate_verifier::VerifierError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingInput(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Verifier(#[from] VerifierError),

    #[error("server error: {0}")]
    Server(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Verifier(_) | Self::Server(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// `{success: false, error, message?, details?, timestamp}`.
///
/// The error text is echoed verbatim, upstream bodies included. That is
/// only acceptable because this service is a demo.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "timestamp": fraudgate_utils::now_iso(),
        });
        match &self {
            Self::Verifier(e) => {
                body["message"] = json!("Verifier communication failed");
                body["details"] = json!(e.details().unwrap_or("no response from verifier"));
            }
            Self::Server(_) | Self::Internal(_) => {
                body["message"] = json!("Unexpected error while handling the request");
            }
            Self::MissingInput(_) | Self::InvalidBody(_) => {}
        }
        (status, Json(body)).into_response()
    }
}
