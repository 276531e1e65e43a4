//! Clinical insight reports
//!
//! - `thresholds`: per-feature interpretation and risk tier tables
//! - `templates`: fixed recommendation / next-step / confidence text
//! - `annotator`: `RiskAnnotator`, composes the `DiagnosisReport`

pub mod annotator;
pub mod templates;
pub mod thresholds;

pub use annotator::{FeatureMap, RiskAnnotator, RISK_ANALYSIS_TOP_N};
pub use thresholds::{Direction, InterpretationRule, RiskThreshold};
