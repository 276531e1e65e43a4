//! Serializable results returned by `PredictionService`

use serde::Serialize;

use crate::ml_engine::BoosterParams;
use crate::types::{BatchPrediction, ClassProbabilities, ClassificationMetrics, DiagnosisReport, FeatureImportance};

/// Human-readable model family reported by `model_info`.
pub const MODEL_TYPE: &str = "GradientBoostedTreeClassifier";

#[derive(Debug, Clone, Serialize)]
pub struct SinglePrediction {
    pub prediction: u8,
    pub probabilities: ClassProbabilities,
    pub confidence: f64,
    pub diagnosis: DiagnosisReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPredictions {
    pub predictions: Vec<BatchPrediction>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportanceView {
    /// Every feature, descending by score
    pub importance: FeatureImportance,
    pub top_10: FeatureImportance,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    #[serde(rename = "type")]
    pub model_type: &'static str,
    pub is_trained: bool,
    pub parameters: BoosterParams,
    /// Raw features a prediction request must carry
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    /// Per augmented column (`feature_i` and `feature_i_sq`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrainOutcome {
    pub status: &'static str,
    pub metrics: ClassificationMetrics,
    pub n_trees: usize,
    pub saved: bool,
}
