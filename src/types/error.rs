//! Error taxonomy for the prediction pipeline

use thiserror::Error;

use crate::ml_engine::PersistenceError;

#[derive(Debug, Error)]
pub enum PredictionError {
    /// Client sent the wrong number or type of features.
    #[error("Invalid feature shape: expected {expected} features, got {actual} ({reason})")]
    InvalidFeatureShape {
        expected: usize,
        actual: usize,
        reason: String,
    },

    /// No trained model is published yet.
    #[error("Model not trained: {0}")]
    ModelNotTrained(&'static str),

    #[error("Dimension mismatch: expected width {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    /// Only ever converted into a degraded report, never returned to callers.
    #[error("Report generation failed: {0}")]
    ReportGeneration(String),

    /// Retraining would replace a model it cannot reproduce.
    #[error("Retrain rejected: {0}")]
    RetrainRejected(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictionError {
    /// Stable machine-readable code used in HTTP error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFeatureShape { .. } => "INVALID_FEATURE_SHAPE",
            Self::ModelNotTrained(_) => "MODEL_NOT_READY",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::EmptyTrainingSet => "EMPTY_TRAINING_SET",
            Self::InvalidTrainingData(_) => "INVALID_TRAINING_DATA",
            Self::ReportGeneration(_) => "REPORT_GENERATION_FAILURE",
            Self::RetrainRejected(_) => "RETRAIN_REJECTED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller's input caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFeatureShape { .. })
    }
}
