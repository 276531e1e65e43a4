//! API request handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::envelope::{ApiError, ApiErrorResponse};
use crate::service::{BatchPredictions, ImportanceView, ModelInfo, PredictionService, RetrainOutcome};
use crate::types::ClassificationMetrics;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PredictionService>,
}

impl ApiState {
    pub fn new(service: Arc<PredictionService>) -> Self {
        Self { service }
    }
}

/// Pull `key` out of a JSON object body, or produce the 400 response.
fn body_field(body: Result<Json<Value>, JsonRejection>, key: &str, missing: &str) -> Result<Value, Response> {
    let Json(mut body) = body.map_err(|e| ApiErrorResponse::bad_request(format!("Invalid JSON body: {e}")))?;
    match body.get_mut(key).map(Value::take) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ApiErrorResponse::bad_request(missing)),
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
}

/// GET /api/health
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.service.is_ready(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Model
// ============================================================================

/// GET /api/model/info
pub async fn get_model_info(State(state): State<ApiState>) -> Json<ModelInfo> {
    Json(state.service.model_info())
}

/// GET /api/feature-importance
pub async fn get_feature_importance(State(state): State<ApiState>) -> Result<Json<ImportanceView>, ApiError> {
    Ok(Json(state.service.feature_importance()?))
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<ApiState>) -> Json<ClassificationMetrics> {
    Json(state.service.metrics())
}

/// POST /api/model/retrain
pub async fn retrain_model(State(state): State<ApiState>) -> Result<Json<RetrainOutcome>, ApiError> {
    let outcome = state.service.retrain().await?;
    info!(accuracy = outcome.metrics.accuracy, saved = outcome.saved, "Retrain request completed");
    Ok(Json(outcome))
}

// ============================================================================
// Prediction
// ============================================================================

/// POST /api/predict
///
/// Body: `{"features": [10 numbers] | {"feature_0": .., ..}}`
pub async fn predict(State(state): State<ApiState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let features = match body_field(body, "features", "Missing 'features' field") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.service.predict_one(&features) {
        Ok(result) => {
            debug!(prediction = result.prediction, confidence = result.confidence, "Prediction served");
            Json(result).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/predict/batch
///
/// Body: `{"records": [features, ...]}`
pub async fn predict_batch(State(state): State<ApiState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let records = match body_field(body, "records", "Expected \"records\" as a list") {
        Ok(Value::Array(records)) => records,
        Ok(_) => return ApiErrorResponse::bad_request("Expected \"records\" as a list"),
        Err(resp) => return resp,
    };
    let result: Result<BatchPredictions, _> = state.service.predict_batch(&records);
    match result {
        Ok(batch) => {
            debug!(count = batch.count, "Batch prediction served");
            Json(batch).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

// ============================================================================
// Samples
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub features: Vec<f64>,
}

/// GET /api/generate-sample
pub async fn generate_sample(State(state): State<ApiState>) -> Json<SampleResponse> {
    Json(SampleResponse {
        features: state.service.generate_sample(),
    })
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("Not found")
}
