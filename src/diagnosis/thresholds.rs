//! Fixed clinical threshold tables
//!
//! Two tables per canonical feature code: a single-cut interpretation rule
//! used for the feature summary, and a (high, moderate) pair used for risk
//! tiering. Hemoglobin and platelets are inverted: lower values are worse.

use crate::types::RiskTier;

/// Comparison direction for a threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `value > threshold` is the concerning side
    Above,
    /// `value < threshold` is the concerning side
    Below,
}

impl Direction {
    pub fn crosses(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => value > threshold,
            Direction::Below => value < threshold,
        }
    }
}

/// Single-cut reading of one measurement.
#[derive(Debug, Clone, Copy)]
pub struct InterpretationRule {
    pub code: &'static str,
    pub threshold: f64,
    pub direction: Direction,
    pub concerning: &'static str,
    pub normal: &'static str,
}

impl InterpretationRule {
    pub fn interpret(&self, value: f64) -> &'static str {
        if self.direction.crosses(value, self.threshold) {
            self.concerning
        } else {
            self.normal
        }
    }
}

pub const INTERPRETATION_RULES: [InterpretationRule; 10] = [
    InterpretationRule {
        code: "feature_0",
        threshold: 50.0,
        direction: Direction::Above,
        concerning: "High risk age group",
        normal: "Lower risk age group",
    },
    InterpretationRule {
        code: "feature_1",
        threshold: 20.0,
        direction: Direction::Above,
        concerning: "Large tumor size - high concern",
        normal: "Smaller tumor size",
    },
    InterpretationRule {
        code: "feature_2",
        threshold: 2.0,
        direction: Direction::Above,
        concerning: "Advanced stage",
        normal: "Early stage",
    },
    InterpretationRule {
        code: "feature_3",
        threshold: 0.5,
        direction: Direction::Above,
        concerning: "High genetic risk",
        normal: "Lower genetic risk",
    },
    InterpretationRule {
        code: "feature_4",
        threshold: 11.0,
        direction: Direction::Above,
        concerning: "Elevated WBC - possible infection/inflammation",
        normal: "Normal WBC",
    },
    InterpretationRule {
        code: "feature_5",
        threshold: 12.0,
        direction: Direction::Below,
        concerning: "Low hemoglobin - anemia risk",
        normal: "Normal hemoglobin",
    },
    InterpretationRule {
        code: "feature_6",
        threshold: 150.0,
        direction: Direction::Below,
        concerning: "Low platelets - bleeding risk",
        normal: "Normal platelet count",
    },
    InterpretationRule {
        code: "feature_7",
        threshold: 4.0,
        direction: Direction::Above,
        concerning: "Elevated PSA - high concern",
        normal: "Normal PSA level",
    },
    InterpretationRule {
        code: "feature_8",
        threshold: 126.0,
        direction: Direction::Above,
        concerning: "High glucose - diabetes risk",
        normal: "Normal glucose",
    },
    InterpretationRule {
        code: "feature_9",
        threshold: 30.0,
        direction: Direction::Above,
        concerning: "High BMI - obesity risk",
        normal: "Normal BMI",
    },
];

/// Two-level tiering cut points for one measurement.
#[derive(Debug, Clone, Copy)]
pub struct RiskThreshold {
    pub code: &'static str,
    pub high: f64,
    pub moderate: f64,
    pub direction: Direction,
}

impl RiskThreshold {
    const fn above(code: &'static str, high: f64, moderate: f64) -> Self {
        Self {
            code,
            high,
            moderate,
            direction: Direction::Above,
        }
    }

    const fn below(code: &'static str, high: f64, moderate: f64) -> Self {
        Self {
            code,
            high,
            moderate,
            direction: Direction::Below,
        }
    }

    /// Strict comparisons: a value equal to a cut point stays in the lower tier.
    pub fn tier(&self, value: f64) -> RiskTier {
        if self.direction.crosses(value, self.high) {
            RiskTier::High
        } else if self.direction.crosses(value, self.moderate) {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }
}

pub const RISK_THRESHOLDS: [RiskThreshold; 10] = [
    RiskThreshold::above("feature_0", 70.0, 50.0),   // age
    RiskThreshold::above("feature_1", 30.0, 20.0),   // tumor size
    RiskThreshold::above("feature_2", 3.0, 2.0),     // stage
    RiskThreshold::above("feature_3", 0.8, 0.5),     // genetic risk
    RiskThreshold::above("feature_4", 15.0, 11.0),   // WBC
    RiskThreshold::below("feature_5", 10.0, 12.0),   // hemoglobin
    RiskThreshold::below("feature_6", 100.0, 150.0), // platelets
    RiskThreshold::above("feature_7", 10.0, 4.0),    // PSA
    RiskThreshold::above("feature_8", 200.0, 126.0), // glucose
    RiskThreshold::above("feature_9", 35.0, 30.0),   // BMI
];

pub fn interpretation_rule(code: &str) -> Option<&'static InterpretationRule> {
    INTERPRETATION_RULES.iter().find(|r| r.code == code)
}

pub fn risk_threshold(code: &str) -> Option<&'static RiskThreshold> {
    RISK_THRESHOLDS.iter().find(|t| t.code == code)
}
