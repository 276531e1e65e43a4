//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every /api/* endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use onco_insight::api::{create_app, ApiState};
use onco_insight::{Dataset, ModelBundle, PredictionService, ServiceConfig};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn config_in(dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.model.n_estimators = 20;
    config.data.demo_samples = 150;
    config.paths.data_dir = dir.join("data");
    config.paths.model_dir = dir.join("models");
    config.paths.results_dir = dir.join("results");
    config
}

fn app_for(config: ServiceConfig) -> Router {
    let service = Arc::new(PredictionService::new(config));
    service.load_or_bootstrap().unwrap();
    create_app(ApiState::new(service))
}

/// Bootstrapped service writing its artifact into a temp directory.
fn ready_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (app_for(config_in(dir.path())), dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(resp).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(resp).await
}

async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

const SAMPLE: [f64; 10] = [0.5, -1.2, 2.1, 0.3, -0.4, 1.8, 0.0, -2.2, 0.9, 1.1];

#[tokio::test]
async fn test_health_reports_loaded_model() {
    let (app, _dir) = ready_app();
    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_predict_returns_probabilities_and_diagnosis() {
    let (app, _dir) = ready_app();
    let (status, body) = post(app, "/api/predict", json!({ "features": SAMPLE })).await;
    assert_eq!(status, StatusCode::OK);

    let prediction = body["prediction"].as_u64().unwrap();
    assert!(prediction <= 1);
    let p0 = body["probabilities"]["class_0"].as_f64().unwrap();
    let p1 = body["probabilities"]["class_1"].as_f64().unwrap();
    assert!((p0 + p1 - 1.0).abs() < 1e-9);
    assert!((body["confidence"].as_f64().unwrap() - p0.max(p1)).abs() < 1e-12);

    let diagnosis = &body["diagnosis"];
    assert_eq!(diagnosis["feature_summary"].as_array().unwrap().len(), 10);
    assert!(!diagnosis["recommendations"].as_array().unwrap().is_empty());
    assert!(!diagnosis["next_steps"].as_array().unwrap().is_empty());
    let summary = diagnosis["diagnosis_summary"].as_str().unwrap();
    let expected = if prediction == 1 { "Cancer Risk: HIGH" } else { "Cancer Risk: LOW" };
    assert!(summary.contains(expected));
}

#[tokio::test]
async fn test_predict_accepts_named_object() {
    let (app, _dir) = ready_app();
    let features: serde_json::Map<String, Value> = SAMPLE
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("feature_{i}"), json!(v)))
        .collect();
    let (status, body) = post(app, "/api/predict", json!({ "features": features })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["probabilities"]["class_1"].is_number());
}

#[tokio::test]
async fn test_predict_rejects_wrong_length() {
    let (app, _dir) = ready_app();
    let (status, body) = post(app, "/api/predict", json!({ "features": &SAMPLE[..9] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_predict_rejects_missing_field() {
    let (app, _dir) = ready_app();
    let (status, body) = post(app, "/api/predict", json!({ "values": SAMPLE })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing 'features' field");
}

#[tokio::test]
async fn test_batch_scores_each_record() {
    let (app, _dir) = ready_app();
    let zeros = [0.0_f64; 10];
    let ones = [1.0_f64; 10];
    let records = json!({ "records": [SAMPLE, zeros, ones] });
    let (status, body) = post(app, "/api/predict/batch", records).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    for p in predictions {
        assert!(p["probability"].as_f64().unwrap() >= 0.5);
        assert!(p.get("diagnosis").is_none());
    }
}

#[tokio::test]
async fn test_batch_rejects_non_list_and_bad_record() {
    let (app, _dir) = ready_app();
    let (status, _) = post(app.clone(), "/api/predict/batch", json!({ "records": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(app, "/api/predict/batch", json!({ "records": [SAMPLE, [1.0, 2.0]] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("record 1"));
}

#[tokio::test]
async fn test_feature_importance_is_sorted() {
    let (app, _dir) = ready_app();
    let (status, body) = get(app, "/api/feature-importance").await;
    assert_eq!(status, StatusCode::OK);

    let top = body["top_10"].as_object().unwrap();
    assert_eq!(top.len(), 10);
    let all = body["importance"].as_object().unwrap();
    assert_eq!(all.len(), 20);
    let total: f64 = all.values().map(|v| v.as_f64().unwrap()).sum();
    assert!(total == 0.0 || (total - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_model_info_and_metrics() {
    let (app, _dir) = ready_app();
    let (status, info) = get(app.clone(), "/api/model/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["type"], "GradientBoostedTreeClassifier");
    assert_eq!(info["is_trained"], true);
    assert_eq!(info["feature_count"], 10);
    let names: Vec<&str> = info["feature_names"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap())
        .collect();
    assert_eq!(names, (0..10).map(|i| format!("feature_{i}")).collect::<Vec<_>>());
    assert_eq!(info["feature_importance"].as_object().unwrap().len(), 20);
    assert_eq!(info["parameters"]["n_estimators"], 20);

    let (status, metrics) = get(app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for key in ["accuracy", "precision", "recall", "f1"] {
        let v = metrics[key].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&v), "{key} = {v}");
    }
}

#[tokio::test]
async fn test_generate_sample_round_trips_through_predict() {
    let (app, _dir) = ready_app();
    let (status, sample) = get(app.clone(), "/api/generate-sample").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sample["features"].as_array().unwrap().len(), 10);

    let (status, _) = post(app, "/api/predict", sample).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_retrain_publishes_new_model() {
    let (app, dir) = ready_app();
    let (status, body) = post(app.clone(), "/api/model/retrain", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "retrained");
    assert_eq!(body["saved"], true);
    assert!(dir.path().join("models").join("gbt_model.json").exists());

    let (status, _) = post(app, "/api/predict", json!({ "features": SAMPLE })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_retrain_conflicts_for_csv_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let synthetic = Dataset::synthetic(150, 10, 21);
    let csv = dir.path().join("patients.csv");
    let mut text = format!("{},target\n", synthetic.feature_names.join(","));
    for (row, y) in synthetic.rows.iter().zip(&synthetic.targets) {
        let cells: Vec<String> = row.iter().map(f64::to_string).collect();
        text.push_str(&format!("{},{}\n", cells.join(","), y));
    }
    std::fs::write(&csv, text).unwrap();
    ModelBundle::from_csv(&config, &csv)
        .unwrap()
        .save(&config.paths.model_path())
        .unwrap();
    let saved = std::fs::read(config.paths.model_path()).unwrap();

    let app = app_for(config.clone());
    let (status, body) = post(app, "/api/model/retrain", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "RETRAIN_REJECTED");
    assert_eq!(std::fs::read(config.paths.model_path()).unwrap(), saved);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let (app, _dir) = ready_app();
    let (status, body) = get(app, "/api/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["meta"]["timestamp"].is_string());
}
