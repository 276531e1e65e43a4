//! Rule-based risk annotator
//!
//! Turns a prediction, its confidence, the raw feature values and the model's
//! feature importances into a `DiagnosisReport`. Every operation is a pure
//! function of its arguments; the annotator holds no state.
//!
//! Feature maps are ordered `(code, value)` pairs so that summaries and
//! tie-breaks follow the caller's key order.

use tracing::{debug, error};

use super::templates::{self, to_strings};
use super::thresholds::{interpretation_rule, risk_threshold};
use crate::types::{
    clinical_name, ClinicalReport, DiagnosisReport, FeatureImportance, FeatureSummaryEntry,
    PredictionError, RiskAnalysis, RiskFactor, RiskTier,
};

/// Number of most-important features bucketed in the risk analysis.
pub const RISK_ANALYSIS_TOP_N: usize = 5;

/// Number of factors named in the clinical summary.
const SUMMARY_TOP_FACTORS: usize = 3;

/// Ordered `(feature code, value)` pairs.
pub type FeatureMap = [(String, f64)];

fn lookup(features: &FeatureMap, code: &str) -> Option<f64> {
    features.iter().find(|(c, _)| c == code).map(|(_, v)| *v)
}

fn display_name(code: &str) -> String {
    clinical_name(code).map_or_else(|| code.to_string(), str::to_string)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAnnotator;

impl RiskAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Single-threshold reading of one value.
    pub fn interpret_feature(&self, code: &str, value: f64) -> String {
        interpretation_rule(code)
            .map_or(templates::UNKNOWN_FEATURE_INTERPRETATION, |rule| rule.interpret(value))
            .to_string()
    }

    /// Tier for one value; unknown codes are `Moderate`.
    pub fn assess_risk_level(&self, code: &str, value: f64) -> RiskTier {
        risk_threshold(code).map_or(RiskTier::Moderate, |t| t.tier(value))
    }

    /// Canonical features only, in the caller's order.
    pub fn build_feature_summary(&self, features: &FeatureMap) -> Vec<FeatureSummaryEntry> {
        features
            .iter()
            .filter_map(|(code, value)| {
                clinical_name(code).map(|name| FeatureSummaryEntry {
                    feature: name.to_string(),
                    code: code.clone(),
                    value: *value,
                    interpretation: self.interpret_feature(code, *value),
                })
            })
            .collect()
    }

    /// Bucket the top features by importance. Missing values read as 0.
    pub fn build_risk_analysis(&self, features: &FeatureMap, importances: &FeatureImportance) -> RiskAnalysis {
        let mut analysis = RiskAnalysis::default();
        for (code, importance) in importances.top(RISK_ANALYSIS_TOP_N).iter() {
            let value = lookup(features, code).unwrap_or(0.0);
            let tier = self.assess_risk_level(code, value);
            analysis.push(
                tier,
                RiskFactor {
                    factor: display_name(code),
                    value,
                    importance: *importance,
                    urgency: tier.urgency(),
                },
            );
        }
        analysis
    }

    pub fn build_recommendations(&self, prediction: u8, confidence: f64, features: &FeatureMap) -> Vec<String> {
        let mut recs = if prediction == 1 {
            to_strings(&templates::POSITIVE_RECOMMENDATIONS)
        } else {
            to_strings(&templates::NEGATIVE_RECOMMENDATIONS)
        };

        let value = |code: &str| lookup(features, code).unwrap_or(0.0);
        if value("feature_0") > 60.0 {
            recs.push(templates::AGE_MONITORING.to_string());
        }
        if value("feature_3") > 0.7 {
            recs.push(templates::GENETIC_COUNSELING.to_string());
        }
        if value("feature_4") > 11.0 {
            recs.push(templates::ELEVATED_WBC.to_string());
        }
        if confidence < 0.6 {
            recs.push(templates::LOW_CONFIDENCE.to_string());
        }
        recs
    }

    pub fn suggest_next_steps(&self, prediction: u8, confidence: f64) -> Vec<String> {
        match (prediction == 1, confidence > 0.8) {
            (true, true) => to_strings(&templates::NEXT_STEPS_CONFIDENT_POSITIVE),
            (true, false) => to_strings(&templates::NEXT_STEPS_TENTATIVE_POSITIVE),
            (false, _) => to_strings(&templates::NEXT_STEPS_NEGATIVE),
        }
    }

    /// Qualitative label; every boundary is an exclusive lower bound.
    pub fn interpret_confidence(&self, confidence: f64) -> String {
        let label = if confidence > 0.9 {
            templates::CONFIDENCE_VERY_HIGH
        } else if confidence > 0.8 {
            templates::CONFIDENCE_HIGH
        } else if confidence > 0.7 {
            templates::CONFIDENCE_GOOD
        } else if confidence > 0.6 {
            templates::CONFIDENCE_MODERATE
        } else {
            templates::CONFIDENCE_LOW
        };
        label.to_string()
    }

    /// Free-text assessment leading the report.
    pub fn build_clinical_summary(
        &self,
        prediction: u8,
        confidence: f64,
        features: &FeatureMap,
        importances: &FeatureImportance,
    ) -> String {
        let headline = if prediction == 1 {
            "Cancer Risk: HIGH - Positive prediction detected"
        } else {
            "Cancer Risk: LOW - Negative prediction"
        };
        let strength = if confidence > 0.8 {
            "strong"
        } else if confidence > 0.6 {
            "moderate"
        } else {
            "weak"
        };
        let top_factors: Vec<String> = importances
            .top(SUMMARY_TOP_FACTORS)
            .iter()
            .map(|(code, _)| display_name(code))
            .collect();
        let analysed: Vec<String> = features.iter().take(5).map(|(code, _)| display_name(code)).collect();
        let pct = confidence * 100.0;

        format!(
            "{headline}\n\
             Model confidence: {pct:.1}%\n\
             \n\
             Primary risk factors: {factors}\n\
             \n\
             Clinical Assessment:\n\
             The gradient-boosted tree model has analyzed {n} critical medical parameters to assess cancer risk.\n\
             The model shows {strength} confidence in this prediction.\n\
             \n\
             Key Findings:\n\
             - Prediction Score: {prediction}\n\
             - Model Confidence: {pct:.1}%\n\
             - Analysis based on: {analysed}... and more\n\
             \n\
             {disclaimer}",
            factors = top_factors.join(", "),
            n = features.len(),
            analysed = analysed.join(", "),
            disclaimer = templates::REVIEW_DISCLAIMER,
        )
    }

    /// Compose the full report.
    ///
    /// Never fails: absent or unusable features yield
    /// `DiagnosisReport::Degraded` carrying the reason.
    pub fn generate_report(
        &self,
        features: Option<&FeatureMap>,
        prediction: u8,
        confidence: f64,
        importances: &FeatureImportance,
    ) -> DiagnosisReport {
        match self.try_generate(features, prediction, confidence, importances) {
            Ok(report) => {
                debug!(
                    prediction,
                    high = report.risk_analysis.high_risk.len(),
                    recommendations = report.recommendations.len(),
                    "Diagnosis report generated"
                );
                DiagnosisReport::Complete(report)
            }
            Err(e) => {
                error!("Error generating diagnosis report: {}", e);
                DiagnosisReport::Degraded {
                    error: e.to_string(),
                    message: templates::REPORT_FAILURE_MESSAGE.to_string(),
                }
            }
        }
    }

    fn try_generate(
        &self,
        features: Option<&FeatureMap>,
        prediction: u8,
        confidence: f64,
        importances: &FeatureImportance,
    ) -> Result<ClinicalReport, PredictionError> {
        let features =
            features.ok_or_else(|| PredictionError::ReportGeneration("feature mapping is missing".into()))?;
        if features.is_empty() {
            return Err(PredictionError::ReportGeneration("feature mapping is empty".into()));
        }
        if let Some((code, value)) = features.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PredictionError::ReportGeneration(format!(
                "feature {code} has non-finite value {value}"
            )));
        }
        if !confidence.is_finite() {
            return Err(PredictionError::ReportGeneration(format!(
                "confidence {confidence} is not finite"
            )));
        }

        Ok(ClinicalReport {
            diagnosis_summary: self.build_clinical_summary(prediction, confidence, features, importances),
            risk_analysis: self.build_risk_analysis(features, importances),
            recommendations: self.build_recommendations(prediction, confidence, features),
            feature_summary: self.build_feature_summary(features),
            confidence_level: self.interpret_confidence(confidence),
            next_steps: self.suggest_next_steps(prediction, confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureVector, Urgency, FEATURE_CODES};

    fn patient() -> Vec<(String, f64)> {
        FeatureVector::new([65.0, 25.0, 3.0, 0.8, 12.0, 11.0, 120.0, 8.0, 150.0, 32.0]).named()
    }

    fn importances() -> FeatureImportance {
        let scores = [0.30, 0.05, 0.20, 0.15, 0.02, 0.10, 0.08, 0.04, 0.03, 0.03];
        FeatureImportance(
            FEATURE_CODES
                .iter()
                .zip(scores)
                .map(|(c, s)| ((*c).to_string(), s))
                .collect(),
        )
    }

    #[test]
    fn test_hemoglobin_comparator_is_inverted() {
        let a = RiskAnnotator::new();
        assert_eq!(a.assess_risk_level("feature_5", 8.0), RiskTier::High);
        assert_eq!(a.assess_risk_level("feature_5", 11.0), RiskTier::Moderate);
        assert_eq!(a.assess_risk_level("feature_5", 13.0), RiskTier::Low);
        assert_eq!(a.assess_risk_level("feature_0", 75.0), RiskTier::High);
        assert_eq!(a.assess_risk_level("mystery", 1.0), RiskTier::Moderate);
    }

    #[test]
    fn test_interpret_feature_rules() {
        let a = RiskAnnotator::new();
        assert_eq!(a.interpret_feature("feature_0", 51.0), "High risk age group");
        assert_eq!(a.interpret_feature("feature_0", 50.0), "Lower risk age group");
        assert_eq!(a.interpret_feature("feature_6", 140.0), "Low platelets - bleeding risk");
        assert_eq!(a.interpret_feature("bogus", 3.0), "Value within range");
    }

    #[test]
    fn test_confidence_labels_use_strict_bounds() {
        let a = RiskAnnotator::new();
        assert!(a.interpret_confidence(0.95).starts_with("Very High"));
        assert!(a.interpret_confidence(0.9).starts_with("High"));
        assert!(a.interpret_confidence(0.75).starts_with("Good"));
        assert!(a.interpret_confidence(0.7).starts_with("Moderate"));
        assert!(a.interpret_confidence(0.55).contains("Low"));
    }

    #[test]
    fn test_positive_recommendations_with_age_and_genetics() {
        let a = RiskAnnotator::new();
        let recs = a.build_recommendations(1, 0.85, &patient());
        assert_eq!(&recs[..5], &to_strings(&templates::POSITIVE_RECOMMENDATIONS)[..]);
        assert_eq!(recs[5], templates::AGE_MONITORING);
        assert_eq!(recs[6], templates::GENETIC_COUNSELING);
        assert_eq!(recs[7], templates::ELEVATED_WBC);
        assert_eq!(recs.len(), 8);
    }

    #[test]
    fn test_negative_low_confidence_recommendations() {
        let a = RiskAnnotator::new();
        let features = vec![("feature_0".to_string(), 30.0)];
        let recs = a.build_recommendations(0, 0.55, &features);
        assert_eq!(recs.len(), 5);
        assert_eq!(recs.last().map(String::as_str), Some(templates::LOW_CONFIDENCE));
    }

    #[test]
    fn test_next_step_branches() {
        let a = RiskAnnotator::new();
        assert_eq!(a.suggest_next_steps(1, 0.81)[0], NEXT_STEP_CONFIDENT);
        assert_eq!(a.suggest_next_steps(1, 0.8)[0], "1. Schedule oncology consultation for further evaluation");
        assert_eq!(a.suggest_next_steps(0, 0.99)[0], "1. Continue routine surveillance");
        assert!(a.suggest_next_steps(0, 0.2).len() >= 5);
    }

    const NEXT_STEP_CONFIDENT: &str = "1. Schedule immediate oncology consultation";

    #[test]
    fn test_risk_analysis_uses_top_five() {
        let a = RiskAnnotator::new();
        let analysis = a.build_risk_analysis(&patient(), &importances());
        assert_eq!(analysis.total(), RISK_ANALYSIS_TOP_N);
        // age 65 -> moderate, stage 3 -> moderate, genetic 0.8 -> moderate,
        // hemoglobin 11 -> moderate, platelets 120 -> moderate
        assert_eq!(analysis.moderate_risk.len(), 5);
        assert_eq!(analysis.moderate_risk[0].factor, "Patient Age");
        assert!(analysis.moderate_risk.iter().all(|f| f.urgency == Urgency::Monitor));
    }

    #[test]
    fn test_risk_analysis_missing_value_reads_zero() {
        let a = RiskAnnotator::new();
        let imp = FeatureImportance(vec![("feature_6".into(), 1.0)]);
        let analysis = a.build_risk_analysis(&[], &imp);
        assert_eq!(analysis.high_risk.len(), 1);
        assert_eq!(analysis.high_risk[0].value, 0.0);
    }

    #[test]
    fn test_full_report_is_deterministic() {
        let a = RiskAnnotator::new();
        let features = patient();
        let first = a.generate_report(Some(features.as_slice()), 1, 0.85, &importances());
        let second = a.generate_report(Some(features.as_slice()), 1, 0.85, &importances());
        assert_eq!(first, second);

        let report = first.as_complete().unwrap();
        assert_eq!(report.feature_summary.len(), 10);
        assert_eq!(report.confidence_level, templates::CONFIDENCE_HIGH);
        assert!(report.diagnosis_summary.contains("Cancer Risk: HIGH"));
        assert!(report.diagnosis_summary.contains("Model confidence: 85.0%"));
        assert!(report
            .diagnosis_summary
            .contains("Primary risk factors: Patient Age, Cancer Stage, Genetic Risk Score"));
        assert!(report.diagnosis_summary.contains("strong confidence"));
    }

    #[test]
    fn test_missing_features_degrade_instead_of_failing() {
        let a = RiskAnnotator::new();
        let report = a.generate_report(None, 1, 0.9, &importances());
        assert!(report.is_degraded());
        assert!(report.error().unwrap().contains("missing"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["message"], templates::REPORT_FAILURE_MESSAGE);

        let nan = vec![("feature_0".to_string(), f64::NAN)];
        assert!(a.generate_report(Some(nan.as_slice()), 0, 0.9, &importances()).is_degraded());
    }
}
