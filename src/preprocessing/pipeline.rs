//! Fitted feature pipeline: augmentation followed by optional scaling

use serde::{Deserialize, Serialize};

use super::{augment, augment_rows, ScalingStatistics};
use crate::types::PredictionError;

/// Raw row → model input transform, frozen after `fit`.
///
/// Holds the scaling statistics learned from the training partition (when
/// scaling is enabled). Cloned wholesale into each published model bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePreprocessor {
    raw_width: usize,
    scaling: Option<ScalingStatistics>,
}

impl FeaturePreprocessor {
    /// Learn scaling statistics from raw (unaugmented) training rows.
    pub fn fit(train_rows: &[Vec<f64>], scale: bool) -> Result<Self, PredictionError> {
        let first = train_rows.first().ok_or(PredictionError::EmptyTrainingSet)?;
        let raw_width = first.len();
        let scaling = if scale {
            Some(ScalingStatistics::fit(&augment_rows(train_rows))?)
        } else {
            None
        };
        Ok(Self { raw_width, scaling })
    }

    /// Passthrough pipeline (augmentation only) for a known raw width.
    pub fn unscaled(raw_width: usize) -> Self {
        Self {
            raw_width,
            scaling: None,
        }
    }

    pub fn raw_width(&self) -> usize {
        self.raw_width
    }

    pub fn output_width(&self) -> usize {
        self.raw_width * 2
    }

    pub fn scaling(&self) -> Option<&ScalingStatistics> {
        self.scaling.as_ref()
    }

    /// Augment then scale one raw row.
    pub fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if raw.len() != self.raw_width {
            return Err(PredictionError::DimensionMismatch {
                expected: self.raw_width,
                actual: raw.len(),
            });
        }
        let augmented = augment(raw);
        match &self.scaling {
            Some(stats) => stats.transform(&augmented),
            None => Ok(augmented),
        }
    }

    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictionError> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
