//! Prediction outputs and evaluation metrics

use serde::{Deserialize, Serialize};

/// Two-class probability pair. `class_0 + class_1 == 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub class_0: f64,
    pub class_1: f64,
}

impl ClassProbabilities {
    /// Build from the positive-class probability.
    pub fn from_positive(p1: f64) -> Self {
        let p1 = p1.clamp(0.0, 1.0);
        Self {
            class_0: 1.0 - p1,
            class_1: p1,
        }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.class_0, self.class_1]
    }

    /// Maximum class probability.
    pub fn confidence(&self) -> f64 {
        self.class_0.max(self.class_1)
    }
}

/// Label, probabilities and confidence for one scored row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: u8,
    pub probabilities: ClassProbabilities,
    pub confidence: f64,
}

impl PredictionResult {
    pub fn new(prediction: u8, probabilities: ClassProbabilities) -> Self {
        Self {
            prediction,
            probabilities,
            confidence: probabilities.confidence(),
        }
    }
}

/// One entry of a batch response. `probability` is the confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub prediction: u8,
    pub probability: f64,
    pub probabilities: ClassProbabilities,
}

impl From<PredictionResult> for BatchPrediction {
    fn from(r: PredictionResult) -> Self {
        Self {
            prediction: r.prediction,
            probability: r.confidence,
            probabilities: r.probabilities,
        }
    }
}

/// Classification metrics from the most recent evaluation.
///
/// `Default` is the all-zero record reported before any evaluation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub roc_auc: Option<f64>,
}

impl std::fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:.<30} {:.4}", "ACCURACY", self.accuracy)?;
        writeln!(f, "{:.<30} {:.4}", "PRECISION", self.precision)?;
        writeln!(f, "{:.<30} {:.4}", "RECALL", self.recall)?;
        write!(f, "{:.<30} {:.4}", "F1", self.f1)?;
        if let Some(auc) = self.roc_auc {
            write!(f, "\n{:.<30} {:.4}", "ROC_AUC", auc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilities_sum_to_one() {
        for p in [0.0, 0.13, 0.5, 0.999, 1.0] {
            let probs = ClassProbabilities::from_positive(p);
            assert!((probs.class_0 + probs.class_1 - 1.0).abs() < 1e-12);
        }
        assert_eq!(ClassProbabilities::from_positive(0.2).confidence(), 0.8);
    }

    #[test]
    fn test_default_metrics_are_zero_without_auc() {
        let json = serde_json::to_value(ClassificationMetrics::default()).unwrap();
        assert_eq!(json["accuracy"], 0.0);
        assert!(json.get("roc_auc").is_none());
    }
}
