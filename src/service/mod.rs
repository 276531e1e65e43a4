//! Prediction service
//!
//! Composes preprocessing, the inference engine and the risk annotator
//! behind one atomically swappable model bundle.

mod bundle;
mod predictor;
pub mod responses;
pub mod workflow;

pub use bundle::ModelBundle;
pub use predictor::PredictionService;
pub use responses::{BatchPredictions, ImportanceView, ModelInfo, RetrainOutcome, SinglePrediction, MODEL_TYPE};
pub use workflow::{run_csv, run_demo, SampleOutcome, TrainingReport};
