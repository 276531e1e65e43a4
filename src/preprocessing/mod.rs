//! Feature preprocessing
//!
//! ## Stages
//! - `augment`: deterministic squared-term expansion (n → 2n columns)
//! - `scaler`: zero-mean / unit-variance standardization with frozen statistics
//! - `pipeline`: `FeaturePreprocessor`, the fitted augment + scale transform
//! - `dataset`: CSV loading, missing values, seeded splits, synthetic data

pub mod augment;
pub mod dataset;
pub mod pipeline;
pub mod scaler;

pub use augment::{augment, augment_rows, augmented_feature_names};
pub use dataset::{prepare, Dataset, DatasetError, MissingValueStrategy, PreparedData, ValidationSplit};
pub use pipeline::FeaturePreprocessor;
pub use scaler::ScalingStatistics;
