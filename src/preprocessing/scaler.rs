//! Standardization with statistics frozen at training time.
//!
//! Each dimension is mapped to `(x - mean) / std` where mean and population
//! standard deviation come from the training partition only. A dimension with
//! zero variance keeps a divisor of 1.0: it is centred but not rescaled.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::PredictionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingStatistics {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ScalingStatistics {
    /// Compute per-column mean and std over `rows`.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PredictionError> {
        let first = rows.first().ok_or(PredictionError::EmptyTrainingSet)?;
        let width = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(PredictionError::DimensionMismatch {
                expected: width,
                actual: bad.len(),
            });
        }

        let mut mean = Vec::with_capacity(width);
        let mut std = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            let m = column.iter().mean();
            let s = column.iter().population_std_dev();
            mean.push(m);
            // NaN std (single row) falls through to the zero-variance branch
            std.push(if s.is_finite() && s > 0.0 { s } else { 1.0 });
        }

        Ok(Self { mean, std })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub fn transform(&self, vector: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if vector.len() != self.width() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.width(),
                actual: vector.len(),
            });
        }
        Ok(vector
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictionError> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<f64>> {
        vec![vec![1.0, 10.0, 5.0], vec![2.0, 20.0, 5.0], vec![3.0, 30.0, 5.0]]
    }

    #[test]
    fn test_fit_mean_and_population_std() {
        let stats = ScalingStatistics::fit(&rows()).unwrap();
        assert_eq!(stats.width(), 3);
        assert!((stats.mean()[0] - 2.0).abs() < 1e-12);
        assert!((stats.mean()[1] - 20.0).abs() < 1e-12);
        let expected = (2.0f64 / 3.0).sqrt();
        assert!((stats.std()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transformed_training_columns_are_standardized() {
        let stats = ScalingStatistics::fit(&rows()).unwrap();
        let scaled = stats.transform_rows(&rows()).unwrap();
        for col in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_variance_column_is_centred_only() {
        let stats = ScalingStatistics::fit(&rows()).unwrap();
        assert_eq!(stats.std()[2], 1.0);
        let out = stats.transform(&[2.0, 20.0, 7.5]).unwrap();
        assert_eq!(out[2], 2.5);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_training_set_fails() {
        assert!(matches!(
            ScalingStatistics::fit(&[]),
            Err(PredictionError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_width_mismatch_fails() {
        let stats = ScalingStatistics::fit(&rows()).unwrap();
        let err = stats.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::DimensionMismatch { expected: 3, actual: 2 }
        ));
    }
}
