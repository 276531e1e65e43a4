use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rand::Rng;
use rand_distr::StandardNormal;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::bundle::ModelBundle;
use super::responses::{BatchPredictions, ImportanceView, ModelInfo, RetrainOutcome, SinglePrediction, MODEL_TYPE};
use crate::config::{defaults, ServiceConfig};
use crate::diagnosis::RiskAnnotator;
use crate::types::{
    BatchPrediction, ClassificationMetrics, FeatureVector, PredictionError, PredictionResult, FEATURE_CODES,
    NUM_RAW_FEATURES,
};

const NOT_LOADED: &str = "no model is loaded; the service is still starting or retraining failed";

/// Serving facade over the active `ModelBundle`.
///
/// Requests take an `Arc` snapshot of the bundle, so a concurrent retrain
/// never exposes a model paired with another model's scaling statistics.
pub struct PredictionService {
    config: ServiceConfig,
    bundle: ArcSwapOption<ModelBundle>,
    annotator: RiskAnnotator,
    /// Serializes retrains
    retrain_lock: Mutex<()>,
}

impl PredictionService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            bundle: ArcSwapOption::empty(),
            annotator: RiskAnnotator::new(),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.bundle.load().is_some()
    }

    /// Atomically replace the active bundle.
    ///
    /// Only bundles taking the ten canonical raw features can serve requests.
    pub fn publish(&self, bundle: ModelBundle) -> Result<(), PredictionError> {
        if bundle.raw_width() != NUM_RAW_FEATURES {
            return Err(PredictionError::DimensionMismatch {
                expected: NUM_RAW_FEATURES,
                actual: bundle.raw_width(),
            });
        }
        info!(
            trees = bundle.engine.model().map_or(0, |m| m.booster.n_trees()),
            accuracy = bundle.metrics.accuracy,
            "✓ Model bundle published"
        );
        self.bundle.store(Some(Arc::new(bundle)));
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<ModelBundle>, PredictionError> {
        self.bundle.load_full().ok_or(PredictionError::ModelNotTrained(NOT_LOADED))
    }

    /// Load the configured artifact, or train, save and publish a demo model.
    pub fn load_or_bootstrap(&self) -> Result<(), PredictionError> {
        let path = self.config.paths.model_path();
        if path.exists() {
            match ModelBundle::load(&path) {
                Ok(bundle) => match self.publish(bundle) {
                    Ok(()) => {
                        info!(path = %path.display(), "Loaded model artifact");
                        return Ok(());
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Artifact unusable for serving, bootstrapping"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load model artifact, bootstrapping"),
            }
        } else {
            info!(path = %path.display(), "No model artifact found, bootstrapping demo model");
        }

        let bundle = ModelBundle::bootstrap_demo(&self.config)?;
        if let Err(e) = bundle.save(&path) {
            warn!(path = %path.display(), error = %e, "Could not save bootstrapped model");
        }
        self.publish(bundle)
    }

    /// Score one raw feature payload and attach a diagnosis report.
    ///
    /// The payload is validated before the model is consulted.
    pub fn predict_one(&self, raw: &Value) -> Result<SinglePrediction, PredictionError> {
        let features = FeatureVector::from_json(raw)?;
        let bundle = self.snapshot()?;
        let result = score(&bundle, &features)?;

        let importances = bundle.importance.fold_squared_terms();
        let named = features.named();
        let diagnosis = self
            .annotator
            .generate_report(Some(named.as_slice()), result.prediction, result.confidence, &importances);

        Ok(SinglePrediction {
            prediction: result.prediction,
            probabilities: result.probabilities,
            confidence: result.confidence,
            diagnosis,
        })
    }

    /// Score each record independently; the first invalid record fails the
    /// whole batch.
    pub fn predict_batch(&self, records: &[Value]) -> Result<BatchPredictions, PredictionError> {
        let features: Vec<FeatureVector> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                FeatureVector::from_json(record).map_err(|e| match e {
                    PredictionError::InvalidFeatureShape {
                        expected,
                        actual,
                        reason,
                    } => PredictionError::InvalidFeatureShape {
                        expected,
                        actual,
                        reason: format!("record {i}: {reason}"),
                    },
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bundle = self.snapshot()?;
        let predictions = features
            .iter()
            .map(|f| score(&bundle, f).map(BatchPrediction::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchPredictions {
            count: predictions.len(),
            predictions,
        })
    }

    pub fn feature_importance(&self) -> Result<ImportanceView, PredictionError> {
        let bundle = self.snapshot()?;
        let sorted = bundle.importance.sorted_desc();
        Ok(ImportanceView {
            top_10: sorted.top(defaults::TOP_IMPORTANCE_COUNT),
            importance: sorted,
        })
    }

    pub fn model_info(&self) -> ModelInfo {
        match self.bundle.load_full() {
            Some(bundle) => ModelInfo {
                model_type: MODEL_TYPE,
                is_trained: true,
                parameters: bundle.engine.params().clone(),
                feature_count: NUM_RAW_FEATURES,
                feature_names: FEATURE_CODES.iter().map(|c| c.to_string()).collect(),
                feature_importance: Some(bundle.importance.clone()),
            },
            None => ModelInfo {
                model_type: MODEL_TYPE,
                is_trained: false,
                parameters: self.config.model.clone(),
                feature_count: 0,
                feature_names: Vec::new(),
                feature_importance: None,
            },
        }
    }

    /// Last held-out evaluation, all zeros before any model is published.
    pub fn metrics(&self) -> ClassificationMetrics {
        self.bundle.load_full().map(|b| b.metrics).unwrap_or_default()
    }

    /// Ten standard-normal values, shaped like a prediction payload.
    pub fn generate_sample(&self) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..NUM_RAW_FEATURES).map(|_| rng.sample(StandardNormal)).collect()
    }

    /// Rebuild the serving model off the async runtime, save it and publish it.
    ///
    /// Requests keep using the previous bundle until the new one is ready. A
    /// model trained on real data is only replaced from the configured
    /// training CSV.
    pub async fn retrain(&self) -> Result<RetrainOutcome, PredictionError> {
        let _guard = self.retrain_lock.lock().await;
        info!("Retraining model");

        let config = self.config.clone();
        let current = self.bundle.load_full();
        let (bundle, saved) = tokio::task::spawn_blocking(move || {
            let bundle = ModelBundle::retrain(&config, current.as_deref())?;
            let path = config.paths.model_path();
            let saved = match bundle.save(&path) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Retrained model not saved");
                    false
                }
            };
            Ok::<_, PredictionError>((bundle, saved))
        })
        .await
        .map_err(|e| PredictionError::Internal(format!("retrain task failed: {e}")))??;

        let outcome = RetrainOutcome {
            status: "retrained",
            metrics: bundle.metrics,
            n_trees: bundle.engine.model().map_or(0, |m| m.booster.n_trees()),
            saved,
        };
        self.publish(bundle)?;
        Ok(outcome)
    }
}

fn score(bundle: &ModelBundle, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
    let x = bundle.preprocessor.transform(features.values())?;
    let probs = bundle.engine.predict_proba(&[x])?;
    let p = probs
        .first()
        .copied()
        .ok_or_else(|| PredictionError::Internal("engine returned no probabilities".into()))?;
    Ok(PredictionResult::new(u8::from(p.class_1 > 0.5), p))
}
