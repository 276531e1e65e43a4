//! Fixed recommendation, next-step and confidence text

pub const POSITIVE_RECOMMENDATIONS: [&str; 5] = [
    "🔴 HIGH PRIORITY: Schedule urgent consultation with oncologist",
    "🔴 Recommend comprehensive cancer screening tests",
    "🔴 Consider advanced imaging (CT/MRI) based on tumor type",
    "🔴 Discuss treatment options with medical team",
    "🔴 Genetic counseling if genetic risk factors present",
];

pub const NEGATIVE_RECOMMENDATIONS: [&str; 4] = [
    "🟢 Continue routine cancer screening schedule",
    "🟢 Maintain healthy lifestyle and risk factor management",
    "🟢 Annual check-ups recommended",
    "🟢 Monitor any changes in health status",
];

pub const AGE_MONITORING: &str = "⚠️ Age-related monitoring: Increase screening frequency";
pub const GENETIC_COUNSELING: &str = "⚠️ Genetic risk: Consider genetic testing and family counseling";
pub const ELEVATED_WBC: &str = "⚠️ Elevated WBC: Investigate for infection or other conditions";
pub const LOW_CONFIDENCE: &str = "⚠️ LOW CONFIDENCE: Additional testing recommended for confirmation";

pub const NEXT_STEPS_CONFIDENT_POSITIVE: [&str; 5] = [
    "1. Schedule immediate oncology consultation",
    "2. Perform confirmatory diagnostic tests (imaging, biopsy)",
    "3. Staging studies if cancer confirmed",
    "4. Develop treatment plan with oncology team",
    "5. Consider second opinion for validation",
];

pub const NEXT_STEPS_TENTATIVE_POSITIVE: [&str; 5] = [
    "1. Schedule oncology consultation for further evaluation",
    "2. Additional diagnostic testing recommended",
    "3. Close monitoring with follow-up tests in 4-6 weeks",
    "4. Repeat screening after defined interval",
    "5. Lifestyle modifications to reduce risk factors",
];

pub const NEXT_STEPS_NEGATIVE: [&str; 5] = [
    "1. Continue routine surveillance",
    "2. Maintain cancer screening schedule",
    "3. Monitor for any symptoms or changes",
    "4. Annual medical check-ups",
    "5. Maintain healthy lifestyle and risk factor control",
];

pub const CONFIDENCE_VERY_HIGH: &str = "Very High - Strong indicator";
pub const CONFIDENCE_HIGH: &str = "High - Reliable prediction";
pub const CONFIDENCE_GOOD: &str = "Good - Moderately reliable";
pub const CONFIDENCE_MODERATE: &str = "Moderate - Consider with other tests";
pub const CONFIDENCE_LOW: &str = "Low - Additional testing recommended";

pub const UNKNOWN_FEATURE_INTERPRETATION: &str = "Value within range";
pub const REPORT_FAILURE_MESSAGE: &str = "Failed to generate diagnosis report";

pub const REVIEW_DISCLAIMER: &str =
    "This analysis should be reviewed by qualified medical professionals for clinical decision-making.";

pub fn to_strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| (*s).to_string()).collect()
}
