//! API route definitions
//!
//! - /api/health - liveness and model readiness
//! - /api/model/info - model type, parameters and feature names
//! - /api/predict - single prediction with diagnosis report
//! - /api/predict/batch - bare batch predictions
//! - /api/generate-sample - random ten-feature payload
//! - /api/feature-importance - sorted importance and top-10 view
//! - /api/metrics - last held-out evaluation
//! - /api/model/retrain - rebuild and publish the demo model

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

/// Create all API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/model/info", get(handlers::get_model_info))
        .route("/model/retrain", post(handlers::retrain_model))
        .route("/predict", post(handlers::predict))
        .route("/predict/batch", post(handlers::predict_batch))
        .route("/generate-sample", get(handlers::generate_sample))
        .route("/feature-importance", get(handlers::get_feature_importance))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::service::PredictionService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn cold_state() -> ApiState {
        ApiState::new(Arc::new(PredictionService::new(ServiceConfig::default())))
    }

    #[tokio::test]
    async fn test_health_reports_not_loaded() {
        let resp = api_routes(cold_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["status"], "healthy");
        assert_eq!(v["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_cold_service_is_unavailable() {
        let resp = api_routes(cold_state())
            .oneshot(Request::builder().uri("/feature-importance").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cold_metrics_are_zero() {
        let resp = api_routes(cold_state())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["accuracy"], 0.0);
    }
}
