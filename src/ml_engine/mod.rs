//! Gradient-boosted tree inference engine
//!
//! ## Architecture
//! - `tree`: second-order regression tree (rayon split search)
//! - `booster`: binary log-loss boosting with seeded row/column sampling
//!   and validation-based early stopping
//! - `metrics`: accuracy, weighted precision/recall/F1, ROC-AUC
//! - `engine`: `InferenceEngine`, the train/predict/importance/evaluate facade
//! - `persistence`: checksummed JSON model artifacts, atomic saves

pub mod booster;
pub mod engine;
pub mod metrics;
pub mod persistence;
pub mod tree;

pub use booster::{sigmoid, BoosterParams, GradientBoostedClassifier};
pub use engine::{InferenceEngine, TrainedModel};
pub use metrics::evaluate;
pub use persistence::{ArtifactPayload, ModelArtifact, PersistenceError, TrainingSource, ARTIFACT_VERSION};
pub use tree::{RegressionTree, TreeNode};
