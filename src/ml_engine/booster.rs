//! Binary gradient-boosted tree classifier (log-loss, Newton leaves)
//!
//! Each round fits a `RegressionTree` to the first and second derivatives of
//! the logistic loss at the current margin. An optional validation pair is
//! only scored, never fitted; with `early_stopping_rounds` set the ensemble is
//! truncated to the best validation round.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::tree::{RegressionTree, TreeParams};
use crate::types::PredictionError;

const PROB_EPS: f64 = 1e-15;

/// Hyperparameters for `GradientBoostedClassifier::fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub n_estimators: usize,
    pub seed: u64,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    /// Row fraction sampled per round
    pub subsample: f64,
    /// Feature fraction sampled per round
    pub colsample: f64,
    pub early_stopping_rounds: Option<usize>,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            max_depth: 5,
            learning_rate: 0.1,
            n_estimators: 100,
            seed: 42,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            subsample: 1.0,
            colsample: 1.0,
            early_stopping_rounds: None,
        }
    }
}

impl BoosterParams {
    pub fn validate(&self) -> Result<(), PredictionError> {
        let bad = |msg: String| Err(PredictionError::InvalidTrainingData(msg));
        if self.n_estimators == 0 {
            return bad("n_estimators must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return bad(format!("learning_rate {} outside (0, 1]", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return bad(format!("subsample {} outside (0, 1]", self.subsample));
        }
        if !(self.colsample > 0.0 && self.colsample <= 1.0) {
            return bad(format!("colsample {} outside (0, 1]", self.colsample));
        }
        if self.min_child_weight < 0.0 || self.reg_lambda < 0.0 {
            return bad("min_child_weight and reg_lambda must be non-negative".into());
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            min_child_weight: self.min_child_weight,
            reg_lambda: self.reg_lambda,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    /// Initial log-odds
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    /// Validation log-loss after each round, when a validation pair was given
    #[serde(default)]
    validation_loss: Vec<f64>,
    #[serde(default)]
    best_iteration: Option<usize>,
}

impl GradientBoostedClassifier {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        validation: Option<(&[Vec<f64>], &[u8])>,
        params: &BoosterParams,
    ) -> Result<Self, PredictionError> {
        params.validate()?;
        let n_features = check_matrix(x, y)?;
        if let Some((vx, vy)) = validation {
            if !vx.is_empty() {
                let width = check_matrix(vx, vy)?;
                if width != n_features {
                    return Err(PredictionError::DimensionMismatch {
                        expected: n_features,
                        actual: width,
                    });
                }
            }
        }

        let n = x.len();
        let positives = y.iter().filter(|&&l| l == 1).count() as f64;
        let prior = (positives / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let base_score = (prior / (1.0 - prior)).ln();

        let mut rng = StdRng::seed_from_u64(params.seed);
        let tree_params = params.tree_params();
        let n_rows = ((n as f64) * params.subsample).ceil().max(1.0) as usize;
        let n_cols = ((n_features as f64) * params.colsample).ceil().max(1.0) as usize;

        let mut margins = vec![base_score; n];
        let mut val_margins: Vec<f64> = validation
            .map(|(vx, _)| vec![base_score; vx.len()])
            .unwrap_or_default();

        let mut model = Self {
            base_score,
            trees: Vec::with_capacity(params.n_estimators),
            n_features,
            validation_loss: Vec::new(),
            best_iteration: None,
        };
        let mut best_loss = f64::INFINITY;
        let mut rounds_since_best = 0usize;

        for round in 0..params.n_estimators {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for (m, &label) in margins.iter().zip(y) {
                let p = sigmoid(*m);
                grad.push(p - f64::from(label));
                hess.push((p * (1.0 - p)).max(PROB_EPS));
            }

            let rows = draw(&mut rng, n, n_rows);
            let features = draw(&mut rng, n_features, n_cols);
            let tree = RegressionTree::fit(x, &grad, &hess, &rows, &features, tree_params);

            for (m, row) in margins.iter_mut().zip(x) {
                *m += tree.predict(row);
            }
            model.trees.push(tree);

            let Some((vx, vy)) = validation.filter(|(vx, _)| !vx.is_empty()) else {
                continue;
            };
            let latest = model.trees.last();
            for (m, row) in val_margins.iter_mut().zip(vx) {
                *m += latest.map_or(0.0, |t| t.predict(row));
            }
            let loss = log_loss(&val_margins, vy);
            model.validation_loss.push(loss);

            if loss < best_loss {
                best_loss = loss;
                model.best_iteration = Some(round);
                rounds_since_best = 0;
            } else {
                rounds_since_best += 1;
            }
            if let Some(patience) = params.early_stopping_rounds {
                if rounds_since_best >= patience {
                    debug!(round, best = ?model.best_iteration, "Early stopping triggered");
                    break;
                }
            }
        }

        if params.early_stopping_rounds.is_some() {
            if let Some(best) = model.best_iteration {
                model.trees.truncate(best + 1);
            }
        }

        info!(
            trees = model.trees.len(),
            features = n_features,
            best_iteration = ?model.best_iteration,
            "Boosted ensemble fitted"
        );
        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn validation_loss(&self) -> &[f64] {
        &self.validation_loss
    }

    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    /// Raw log-odds for one row.
    pub fn predict_margin(&self, row: &[f64]) -> Result<f64, PredictionError> {
        if row.len() != self.n_features {
            return Err(PredictionError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    /// Positive-class probability for one row.
    pub fn predict_positive(&self, row: &[f64]) -> Result<f64, PredictionError> {
        self.predict_margin(row).map(sigmoid)
    }

    /// Total split gain per feature, normalized to sum to 1. All zeros when
    /// the ensemble never split.
    pub fn gain_importance(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gain(&mut totals);
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for v in &mut totals {
                *v /= sum;
            }
        }
        totals
    }

    /// Structural sanity check for deserialized models: every tree must be
    /// walkable and reference only known features.
    pub fn validate_structure(&self) -> Result<(), PredictionError> {
        for (t, tree) in self.trees.iter().enumerate() {
            tree.check_structure()
                .map_err(|reason| PredictionError::Internal(format!("tree {t}: {reason}")))?;
        }
        if let Some(max) = self.trees.iter().filter_map(|t| t.max_feature()).max() {
            if max >= self.n_features {
                return Err(PredictionError::DimensionMismatch {
                    expected: self.n_features,
                    actual: max + 1,
                });
            }
        }
        Ok(())
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn log_loss(margins: &[f64], y: &[u8]) -> f64 {
    let total: f64 = margins
        .iter()
        .zip(y)
        .map(|(&m, &label)| {
            let p = sigmoid(m).clamp(PROB_EPS, 1.0 - PROB_EPS);
            if label == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / margins.len().max(1) as f64
}

/// Sorted sample of `k` indices out of `n`, or all of them when `k >= n`.
fn draw(rng: &mut StdRng, n: usize, k: usize) -> Vec<usize> {
    if k >= n {
        return (0..n).collect();
    }
    let mut picked = sample(rng, n, k).into_vec();
    picked.sort_unstable();
    picked
}

fn check_matrix(x: &[Vec<f64>], y: &[u8]) -> Result<usize, PredictionError> {
    let first = x.first().ok_or(PredictionError::EmptyTrainingSet)?;
    let width = first.len();
    if width == 0 {
        return Err(PredictionError::InvalidTrainingData("rows have no features".into()));
    }
    if x.len() != y.len() {
        return Err(PredictionError::InvalidTrainingData(format!(
            "{} rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    if let Some(row) = x.iter().find(|r| r.len() != width) {
        return Err(PredictionError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        });
    }
    if let Some(label) = y.iter().find(|&&l| l > 1) {
        return Err(PredictionError::InvalidTrainingData(format!(
            "label {label} is not binary"
        )));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(PredictionError::InvalidTrainingData("non-finite feature value".into()));
    }
    Ok(width)
}
