// SPDX-License-Identifier: Apache-2.0

//! HTTP error responses for the webhook server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors a webhook request can end in.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Signature header missing or wrong.
    #[error("Invalid webhook signature")]
    Unauthorized,

    /// Payload could not be used.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Anything the pipeline did not turn into an outcome.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Status code this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(message) = &self {
            tracing::error!("Internal error: {message}");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}
