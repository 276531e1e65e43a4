//! Consistent error envelope for all API endpoints.
//!
//! Every failure is rendered as
//! `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`.
//! Successful responses are the bare payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

use crate::types::PredictionError;

/// Metadata included in every error response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn not_found(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::SERVICE_UNAVAILABLE, "MODEL_NOT_READY", msg)
    }
}

/// Handler error: a `PredictionError` rendered through the envelope.
#[derive(Debug)]
pub struct ApiError(pub PredictionError);

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = self.0;
        match &e {
            _ if e.is_client_error() => {
                warn!(error = %e, "Rejected request");
                ApiErrorResponse::bad_request(e.to_string())
            }
            PredictionError::ModelNotTrained(_) => ApiErrorResponse::service_unavailable(e.to_string()),
            PredictionError::RetrainRejected(_) => {
                warn!(error = %e, "Retrain refused");
                ApiErrorResponse::build(StatusCode::CONFLICT, e.code(), e.to_string())
            }
            _ => {
                error!(code = e.code(), error = %e, "Request failed");
                ApiErrorResponse::build(StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string())
            }
        }
    }
}
