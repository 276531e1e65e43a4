//! Onco-Insight: cancer risk prediction service
//!
//! Gradient-boosted classification over ten clinical measurements, with a
//! rule-based clinical insight report attached to every single prediction.
//!
//! ## Architecture
//!
//! - **Preprocessing**: squared-term augmentation and train-fitted scaling
//! - **ML Engine**: second-order gradient boosted trees, metrics, persistence
//! - **Diagnosis**: threshold rules turned into a structured clinical report
//! - **Service**: the published model bundle plus retraining
//! - **API**: JSON endpoints under `/api`

pub mod api;
pub mod config;
pub mod diagnosis;
pub mod ml_engine;
pub mod preprocessing;
pub mod service;
pub mod types;

// Re-export configuration
pub use config::ServiceConfig;

// Re-export the main components
pub use diagnosis::RiskAnnotator;
pub use ml_engine::{BoosterParams, InferenceEngine};
pub use preprocessing::{Dataset, FeaturePreprocessor};
pub use service::{ModelBundle, PredictionService};

// Re-export commonly used types
pub use types::{
    ClassProbabilities, ClassificationMetrics, DiagnosisReport, FeatureImportance, FeatureVector,
    PredictionError, PredictionResult,
};
