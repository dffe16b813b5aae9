//! Mapping of domain errors onto HTTP responses
//!
//! | Error        | Status |
//! |--------------|--------|
//! | Validation   | 400    |
//! | NotFound     | 404    |
//! | Connection   | 503    |
//! | Storage      | 500    |
//! | Config       | 500    |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hackjudge_common::Error;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Storage(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable class name
    pub fn kind(&self) -> &'static str {
        match &self.0 {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Connection(_) => "connection",
            Error::Storage(_) => "storage",
            Error::Config(_) => "config",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        let body = Json(json!({
            "error": message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}
