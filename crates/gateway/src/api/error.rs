//! Mapping of domain errors onto HTTP responses.
//!
//! Every error body has the shape
//! `{ "error": "<message>", "code": "<CODE>", "status": <u16>, "details"?: {...} }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use sara_domain::error::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::QuotaExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Error::TranscriptUnavailable(_) => (StatusCode::NOT_FOUND, "NOT_AVAILABLE"),
            Error::UnknownService(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Collaborator { .. } => (StatusCode::BAD_GATEWAY, "API_ERROR"),
            Error::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Error::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let mut body = serde_json::json!({
            "error": self.0.to_string(),
            "code": code,
            "status": status.as_u16(),
        });

        match &self.0 {
            Error::QuotaExceeded(detail) => {
                body["details"] = serde_json::to_value(detail).unwrap_or_default();
            }
            Error::Collaborator {
                service, transient, ..
            } => {
                body["details"] = serde_json::json!({
                    "service": service,
                    "transient": transient,
                });
            }
            _ => {}
        }

        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "request failed");
        } else {
            tracing::debug!(code, error = %self.0, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Build a standardized JSON error response without a domain error.
pub fn api_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into(),
            "code": code,
            "status": status.as_u16(),
        })),
    )
        .into_response()
}
