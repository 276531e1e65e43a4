//! Shared data structures for the prediction pipeline
//!
//! - Request side: `FeatureVector` (validated raw input), `FeatureImportance`
//! - Model side: `PredictionResult`, `ClassProbabilities`, `ClassificationMetrics`
//! - Report side: `DiagnosisReport` and its risk-analysis pieces
//! - `PredictionError`: the error taxonomy shared by every stage

mod diagnosis;
mod error;
mod features;
mod prediction;

pub use diagnosis::*;
pub use error::*;
pub use features::*;
pub use prediction::*;
