//! Diagnosis report types produced by the risk annotator

use serde::{Deserialize, Serialize};

/// Qualitative risk bucket for a single feature value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low = 0,
    Moderate = 1,
    High = 2,
}

impl RiskTier {
    /// Urgency tag attached to factors in this tier.
    pub fn urgency(self) -> Urgency {
        match self {
            RiskTier::High => Urgency::Urgent,
            RiskTier::Moderate => Urgency::Monitor,
            RiskTier::Low => Urgency::Standard,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Moderate => write!(f, "moderate"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Urgent,
    Monitor,
    Standard,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Urgent => write!(f, "URGENT"),
            Urgency::Monitor => write!(f, "MONITOR"),
            Urgency::Standard => write!(f, "STANDARD"),
        }
    }
}

/// A high-importance feature placed into a risk bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Clinical name, or the raw code when unknown
    pub factor: String,
    pub value: f64,
    pub importance: f64,
    pub urgency: Urgency,
}

/// Top features bucketed by tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub high_risk: Vec<RiskFactor>,
    pub moderate_risk: Vec<RiskFactor>,
    pub low_risk: Vec<RiskFactor>,
}

impl RiskAnalysis {
    pub fn push(&mut self, tier: RiskTier, factor: RiskFactor) {
        match tier {
            RiskTier::High => self.high_risk.push(factor),
            RiskTier::Moderate => self.moderate_risk.push(factor),
            RiskTier::Low => self.low_risk.push(factor),
        }
    }

    pub fn total(&self) -> usize {
        self.high_risk.len() + self.moderate_risk.len() + self.low_risk.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummaryEntry {
    pub feature: String,
    pub code: String,
    pub value: f64,
    pub interpretation: String,
}

/// Fully populated clinical insight report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalReport {
    pub diagnosis_summary: String,
    pub risk_analysis: RiskAnalysis,
    pub recommendations: Vec<String>,
    pub feature_summary: Vec<FeatureSummaryEntry>,
    pub confidence_level: String,
    pub next_steps: Vec<String>,
}

/// Report attached to a single prediction.
///
/// `Degraded` is returned instead of an error when the annotation stage
/// cannot run; it serializes as `{"error": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosisReport {
    Complete(ClinicalReport),
    Degraded { error: String, message: String },
}

impl DiagnosisReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DiagnosisReport::Degraded { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DiagnosisReport::Degraded { error, .. } => Some(error),
            DiagnosisReport::Complete(_) => None,
        }
    }

    pub fn as_complete(&self) -> Option<&ClinicalReport> {
        match self {
            DiagnosisReport::Complete(report) => Some(report),
            DiagnosisReport::Degraded { .. } => None,
        }
    }
}
