//! Inference engine: owns one trained ensemble and its feature names

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::booster::{BoosterParams, GradientBoostedClassifier};
use super::metrics::evaluate;
use super::persistence::{self, ArtifactPayload, PersistenceError};
use crate::types::{
    default_feature_names, ClassProbabilities, ClassificationMetrics, FeatureImportance,
    PredictionError,
};

const NOT_TRAINED: &str = "train the engine or load a saved model first";

/// Immutable fitted ensemble plus the column names it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub booster: GradientBoostedClassifier,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn feature_importance(&self) -> FeatureImportance {
        FeatureImportance(
            self.feature_names
                .iter()
                .cloned()
                .zip(self.booster.gain_importance())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    params: BoosterParams,
    model: Option<TrainedModel>,
}

impl InferenceEngine {
    pub fn new(params: BoosterParams) -> Self {
        Self { params, model: None }
    }

    /// Engine wrapping an already fitted model (e.g. after `load`).
    pub fn from_trained(params: BoosterParams, model: TrainedModel) -> Self {
        Self {
            params,
            model: Some(model),
        }
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// Width the model expects, once trained.
    pub fn n_features(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.booster.n_features())
    }

    /// Fit a fresh ensemble, replacing any previous one.
    ///
    /// `feature_names` defaults to `feature_0..` when not supplied. The
    /// validation pair is scored for monitoring and early stopping only.
    pub fn train(
        &mut self,
        x: &[Vec<f64>],
        y: &[u8],
        feature_names: Option<Vec<String>>,
        validation: Option<(&[Vec<f64>], &[u8])>,
    ) -> Result<&TrainedModel, PredictionError> {
        let booster = GradientBoostedClassifier::fit(x, y, validation, &self.params)?;
        let feature_names = feature_names.unwrap_or_else(|| default_feature_names(booster.n_features()));
        if feature_names.len() != booster.n_features() {
            return Err(PredictionError::DimensionMismatch {
                expected: booster.n_features(),
                actual: feature_names.len(),
            });
        }

        info!(
            rows = x.len(),
            features = booster.n_features(),
            trees = booster.n_trees(),
            "✓ Model trained"
        );
        let model = self.model.insert(TrainedModel {
            booster,
            feature_names,
            trained_at: Utc::now(),
        });
        Ok(&*model)
    }

    fn trained(&self) -> Result<&TrainedModel, PredictionError> {
        self.model.as_ref().ok_or(PredictionError::ModelNotTrained(NOT_TRAINED))
    }

    /// Class probabilities per row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<ClassProbabilities>, PredictionError> {
        let model = self.trained()?;
        x.iter()
            .map(|row| model.booster.predict_positive(row).map(ClassProbabilities::from_positive))
            .collect()
    }

    /// Label per row: 1 when the positive probability exceeds 0.5.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>, PredictionError> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|p| u8::from(p.class_1 > 0.5))
            .collect())
    }

    pub fn feature_importance(&self) -> Result<FeatureImportance, PredictionError> {
        Ok(self.trained()?.feature_importance())
    }

    pub fn evaluate(&self, x: &[Vec<f64>], y: &[u8]) -> Result<ClassificationMetrics, PredictionError> {
        if x.len() != y.len() {
            return Err(PredictionError::InvalidTrainingData(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let probs = self.predict_proba(x)?;
        let positive: Vec<f64> = probs.iter().map(|p| p.class_1).collect();
        let labels: Vec<u8> = positive.iter().map(|&p| u8::from(p > 0.5)).collect();
        Ok(evaluate(y, &labels, &positive))
    }

    /// Write the model alone (no preprocessor, zero metrics) to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PredictionError> {
        let model = self.trained()?;
        let payload = ArtifactPayload {
            params: self.params.clone(),
            model: model.clone(),
            preprocessor: None,
            metrics: ClassificationMetrics::default(),
            source: None,
        };
        persistence::save(path, payload)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let artifact = persistence::load(path)?;
        Ok(Self::from_trained(artifact.payload.params, artifact.payload.model))
    }
}
