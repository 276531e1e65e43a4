//! Tabular datasets: CSV loading, missing-value handling, seeded splitting,
//! synthetic data generation and the prepare step that feeds training.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use statrs::statistics::{Data, Median, Statistics};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{augmented_feature_names, FeaturePreprocessor};
use crate::types::{default_feature_names, PredictionError};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("File {0} has no header row")]
    MissingHeader(PathBuf),

    #[error("Target column '{0}' not found")]
    MissingTarget(String),

    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// How `handle_missing_values` treats NaN cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValueStrategy {
    /// Remove any row with a missing feature.
    Drop,
    /// Fill with the column mean of observed values.
    #[default]
    Mean,
    /// Fill with the column median of observed values.
    Median,
}

impl std::str::FromStr for MissingValueStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(format!("Unknown method: {other}")),
        }
    }
}

/// Feature matrix plus target column. Missing cells are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Load a headed CSV, splitting `target_column` out of the features.
    ///
    /// Empty cells and `NaN`/`NA` tokens load as missing.
    pub fn load_csv(path: &Path, target_column: &str) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|e| DatasetError::Io(path.to_path_buf(), e))?,
            None => return Err(DatasetError::MissingHeader(path.to_path_buf())),
        };
        let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
        let target_idx = columns
            .iter()
            .position(|c| c == target_column)
            .ok_or_else(|| DatasetError::MissingTarget(target_column.to_string()))?;

        let feature_names: Vec<String> = columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, c)| c.clone())
            .collect();

        let mut dataset = Self {
            feature_names,
            ..Default::default()
        };

        for (offset, line) in lines.enumerate() {
            let line_num = offset + 2;
            let line = line.map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != columns.len() {
                return Err(DatasetError::Parse {
                    line: line_num,
                    reason: format!("expected {} fields, got {}", columns.len(), fields.len()),
                });
            }
            let mut row = Vec::with_capacity(columns.len() - 1);
            let mut target = f64::NAN;
            for (i, field) in fields.iter().enumerate() {
                let value = parse_cell(field).map_err(|reason| DatasetError::Parse {
                    line: line_num,
                    reason,
                })?;
                if i == target_idx {
                    target = value;
                } else {
                    row.push(value);
                }
            }
            dataset.rows.push(row);
            dataset.targets.push(target);
        }

        info!(rows = dataset.len(), features = dataset.n_features(), path = %path.display(), "Loaded dataset from CSV");
        Ok(dataset)
    }

    /// Generate a seeded synthetic binary classification problem.
    ///
    /// `X ~ N(0, 1)`, coefficients `c ~ N(0, 1)`, label `1` when `X·c > 0`.
    pub fn synthetic(n_samples: usize, n_features: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let coefficients: Vec<f64> = (0..n_features).map(|_| rng.sample(StandardNormal)).collect();

        let mut rows = Vec::with_capacity(n_samples);
        let mut targets = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let row: Vec<f64> = (0..n_features).map(|_| rng.sample(StandardNormal)).collect();
            let score: f64 = row.iter().zip(&coefficients).map(|(x, c)| x * c).sum();
            targets.push(if score > 0.0 { 1.0 } else { 0.0 });
            rows.push(row);
        }

        Self {
            feature_names: default_feature_names(n_features),
            rows,
            targets,
        }
    }

    /// Fill or drop missing feature cells. Rows with a missing target are
    /// always dropped.
    pub fn handle_missing_values(&self, strategy: MissingValueStrategy) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| !self.targets[i].is_nan())
            .filter(|&i| strategy != MissingValueStrategy::Drop || !self.rows[i].iter().any(|v| v.is_nan()))
            .collect();

        let mut rows: Vec<Vec<f64>> = keep.iter().map(|&i| self.rows[i].clone()).collect();
        let targets: Vec<f64> = keep.iter().map(|&i| self.targets[i]).collect();

        if strategy != MissingValueStrategy::Drop {
            for col in 0..self.n_features() {
                let observed: Vec<f64> = rows.iter().map(|r| r[col]).filter(|v| !v.is_nan()).collect();
                if observed.len() == rows.len() {
                    continue;
                }
                if observed.is_empty() {
                    warn!(column = %self.feature_names[col], "Column has no observed values, leaving missing");
                    continue;
                }
                let fill = match strategy {
                    MissingValueStrategy::Mean => observed.iter().mean(),
                    MissingValueStrategy::Median => Data::new(observed).median(),
                    MissingValueStrategy::Drop => continue,
                };
                for row in &mut rows {
                    if row[col].is_nan() {
                        row[col] = fill;
                    }
                }
            }
        }

        debug!(before = self.len(), after = rows.len(), ?strategy, "Handled missing values");
        Self {
            feature_names: self.feature_names.clone(),
            rows,
            targets,
        }
    }

    /// Seeded shuffle split into `(train, test)`.
    ///
    /// The test partition holds `ceil(len * test_size)` rows.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> (Self, Self) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((self.len() as f64) * test_size).ceil() as usize;
        let n_test = n_test.min(self.len());
        let (test_idx, train_idx) = indices.split_at(n_test);

        (self.subset(train_idx), self.subset(test_idx))
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Targets as binary labels. Anything other than 0 or 1 is rejected.
    pub fn labels(&self) -> Result<Vec<u8>, PredictionError> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| match *t {
                t if t == 0.0 => Ok(0),
                t if t == 1.0 => Ok(1),
                other => Err(PredictionError::InvalidTrainingData(format!(
                    "row {i}: target {other} is not a binary label"
                ))),
            })
            .collect()
    }
}

fn parse_cell(field: &str) -> Result<f64, String> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("'{trimmed}' is not numeric"))
}

/// Train/test partitions after augmentation and scaling.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Augmented column names (`raw..., raw_sq...`)
    pub feature_names: Vec<String>,
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    /// Fitted on the training partition only
    pub preprocessor: FeaturePreprocessor,
}

/// Early-stopping holdout carved out of a training partition.
#[derive(Debug, Clone)]
pub struct ValidationSplit {
    pub x_fit: Vec<Vec<f64>>,
    pub y_fit: Vec<u8>,
    pub x_val: Vec<Vec<f64>>,
    pub y_val: Vec<u8>,
}

impl PreparedData {
    /// Seeded split of the training partition into fit and validation rows.
    /// The test partition is never touched. `None` when fewer than two
    /// training rows exist.
    pub fn validation_split(&self, fraction: f64, seed: u64) -> Option<ValidationSplit> {
        let n = self.x_train.len();
        if n < 2 {
            return None;
        }
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let n_val = (((n as f64) * fraction).ceil() as usize).clamp(1, n - 1);
        let (val_idx, fit_idx) = indices.split_at(n_val);
        let rows = |idx: &[usize]| -> Vec<Vec<f64>> { idx.iter().map(|&i| self.x_train[i].clone()).collect() };
        let labels = |idx: &[usize]| -> Vec<u8> { idx.iter().map(|&i| self.y_train[i]).collect() };

        debug!(fit = fit_idx.len(), validation = val_idx.len(), "Carved validation rows from training partition");
        Some(ValidationSplit {
            x_fit: rows(fit_idx),
            y_fit: labels(fit_idx),
            x_val: rows(val_idx),
            y_val: labels(val_idx),
        })
    }
}

/// Split, augment, fit the scaler on train, and transform both partitions.
pub fn prepare(
    dataset: &Dataset,
    test_size: f64,
    seed: u64,
    scale: bool,
) -> Result<PreparedData, PredictionError> {
    if dataset.is_empty() {
        return Err(PredictionError::EmptyTrainingSet);
    }
    if let Some(i) = dataset.rows.iter().position(|r| r.iter().any(|v| v.is_nan())) {
        return Err(PredictionError::InvalidTrainingData(format!(
            "row {i} has missing values; run handle_missing_values first"
        )));
    }

    let (train, test) = dataset.train_test_split(test_size, seed);
    let preprocessor = FeaturePreprocessor::fit(&train.rows, scale)?;

    let prepared = PreparedData {
        feature_names: augmented_feature_names(&dataset.feature_names),
        x_train: preprocessor.transform_rows(&train.rows)?,
        x_test: preprocessor.transform_rows(&test.rows)?,
        y_train: train.labels()?,
        y_test: test.labels()?,
        preprocessor,
    };

    info!(
        train = prepared.x_train.len(),
        test = prepared.x_test.len(),
        width = prepared.feature_names.len(),
        scaled = scale,
        "Prepared dataset"
    );
    Ok(prepared)
}
