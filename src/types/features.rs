//! Raw and augmented feature vectors plus request-payload validation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PredictionError;

/// Number of raw clinical measurements per prediction request.
pub const NUM_RAW_FEATURES: usize = 10;

/// Width after squared-term augmentation.
pub const NUM_AUGMENTED_FEATURES: usize = NUM_RAW_FEATURES * 2;

/// Canonical feature codes, in model column order.
pub const FEATURE_CODES: [&str; NUM_RAW_FEATURES] = [
    "feature_0", "feature_1", "feature_2", "feature_3", "feature_4",
    "feature_5", "feature_6", "feature_7", "feature_8", "feature_9",
];

/// Clinical names for each canonical code (same order as `FEATURE_CODES`).
pub const CLINICAL_NAMES: [&str; NUM_RAW_FEATURES] = [
    "Patient Age",
    "Tumor Size (mm)",
    "Cancer Stage",
    "Genetic Risk Score",
    "White Blood Cell Count",
    "Hemoglobin Level",
    "Platelet Count",
    "PSA Level (ng/mL)",
    "Glucose Level (mg/dL)",
    "BMI",
];

/// Clinical display name for a feature code, if it is canonical.
pub fn clinical_name(code: &str) -> Option<&'static str> {
    FEATURE_CODES
        .iter()
        .position(|c| *c == code)
        .map(|i| CLINICAL_NAMES[i])
}

/// Default column names `feature_0..feature_{n-1}` for unnamed matrices.
pub fn default_feature_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("feature_{i}")).collect()
}

/// One validated request: exactly ten raw measurements in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; NUM_RAW_FEATURES],
}

impl FeatureVector {
    pub fn new(values: [f64; NUM_RAW_FEATURES]) -> Self {
        Self { values }
    }

    /// Validate a JSON `features` payload.
    ///
    /// Accepts an array of exactly ten numbers, or an object holding at least
    /// the ten canonical keys with numeric values. Extra keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self, PredictionError> {
        match value {
            Value::Array(items) => Self::from_array(items),
            Value::Object(map) => {
                let mut values = [0.0; NUM_RAW_FEATURES];
                let mut present = 0usize;
                let mut missing = Vec::new();
                for (i, code) in FEATURE_CODES.iter().enumerate() {
                    match map.get(*code).and_then(Value::as_f64) {
                        Some(v) => {
                            values[i] = v;
                            present += 1;
                        }
                        None => missing.push(*code),
                    }
                }
                if missing.is_empty() {
                    Ok(Self { values })
                } else {
                    Err(PredictionError::InvalidFeatureShape {
                        expected: NUM_RAW_FEATURES,
                        actual: present,
                        reason: format!("missing or non-numeric keys: {}", missing.join(", ")),
                    })
                }
            }
            Value::Null => Err(PredictionError::InvalidFeatureShape {
                expected: NUM_RAW_FEATURES,
                actual: 0,
                reason: "features must be a list or an object".to_string(),
            }),
            other => Err(PredictionError::InvalidFeatureShape {
                expected: NUM_RAW_FEATURES,
                actual: 1,
                reason: format!("features must be a list or an object, got {}", json_kind(other)),
            }),
        }
    }

    fn from_array(items: &[Value]) -> Result<Self, PredictionError> {
        if items.len() != NUM_RAW_FEATURES {
            return Err(PredictionError::InvalidFeatureShape {
                expected: NUM_RAW_FEATURES,
                actual: items.len(),
                reason: format!("Expected {NUM_RAW_FEATURES} features, got {}", items.len()),
            });
        }
        let mut values = [0.0; NUM_RAW_FEATURES];
        for (i, item) in items.iter().enumerate() {
            values[i] = item.as_f64().ok_or_else(|| PredictionError::InvalidFeatureShape {
                expected: NUM_RAW_FEATURES,
                actual: items.iter().filter(|v| v.is_number()).count(),
                reason: format!("feature at index {i} is not numeric"),
            })?;
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64; NUM_RAW_FEATURES] {
        &self.values
    }

    /// Value of a canonical code, `None` for anything else.
    pub fn get(&self, code: &str) -> Option<f64> {
        FEATURE_CODES
            .iter()
            .position(|c| *c == code)
            .map(|i| self.values[i])
    }

    /// `(code, value)` pairs in canonical order.
    pub fn named(&self) -> Vec<(String, f64)> {
        FEATURE_CODES
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| ((*c).to_string(), *v))
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered `(feature name, score)` pairs.
///
/// Serializes as a JSON object whose keys keep the vector order, so sorted
/// views survive the trip to the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureImportance(pub Vec<(String, f64)>);

impl FeatureImportance {
    pub fn iter(&self) -> impl Iterator<Item = &(String, f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    /// Copy sorted by descending score; ties keep their original order.
    pub fn sorted_desc(&self) -> Self {
        let mut entries = self.0.clone();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Self(entries)
    }

    pub fn top(&self, n: usize) -> Self {
        Self(self.sorted_desc().0.into_iter().take(n).collect())
    }

    /// Fold `<code>_sq` scores into their base code.
    ///
    /// Only base names that already appear in the list are kept.
    pub fn fold_squared_terms(&self) -> Self {
        let mut folded: Vec<(String, f64)> = self
            .0
            .iter()
            .filter(|(n, _)| !n.ends_with("_sq"))
            .cloned()
            .collect();
        for (name, score) in self.0.iter().filter(|(n, _)| n.ends_with("_sq")) {
            let base = name.trim_end_matches("_sq");
            if let Some(entry) = folded.iter_mut().find(|(n, _)| n == base) {
                entry.1 += score;
            }
        }
        Self(folded)
    }
}

impl Serialize for FeatureImportance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, score) in &self.0 {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_of_ten_accepted() {
        let fv = FeatureVector::from_json(&json!([0, 1, 2, 3, 4, 5, 6, 7, 8, 9.5])).unwrap();
        assert_eq!(fv.values()[9], 9.5);
        assert_eq!(fv.get("feature_3"), Some(3.0));
    }

    #[test]
    fn test_short_array_rejected_with_counts() {
        let err = FeatureVector::from_json(&json!(vec![1.0; 9])).unwrap_err();
        match err {
            PredictionError::InvalidFeatureShape { expected, actual, .. } => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_object_with_extra_keys_accepted() {
        let mut payload = serde_json::Map::new();
        for (i, code) in FEATURE_CODES.iter().enumerate() {
            payload.insert((*code).to_string(), json!(i as f64 * 2.0));
        }
        payload.insert("patient_id".to_string(), json!("abc"));
        let fv = FeatureVector::from_json(&Value::Object(payload)).unwrap();
        assert_eq!(fv.get("feature_4"), Some(8.0));
    }

    #[test]
    fn test_object_missing_key_rejected() {
        let err = FeatureVector::from_json(&json!({"feature_0": 1.0, "feature_1": 2.0})).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidFeatureShape { actual: 2, .. }));
    }

    #[test]
    fn test_non_numeric_entries_rejected() {
        let err = FeatureVector::from_json(&json!([1, 2, 3, 4, 5, 6, 7, 8, 9, "x"])).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidFeatureShape { actual: 9, .. }));
        assert!(FeatureVector::from_json(&json!("nope")).is_err());
        assert!(FeatureVector::from_json(&Value::Null).is_err());
    }

    #[test]
    fn test_importance_sorting_is_stable() {
        let fi = FeatureImportance(vec![
            ("a".into(), 0.2),
            ("b".into(), 0.5),
            ("c".into(), 0.2),
            ("d".into(), 0.1),
        ]);
        let names: Vec<_> = fi.sorted_desc().0.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a", "c", "d"]);
        assert_eq!(fi.top(2).len(), 2);
    }

    #[test]
    fn test_fold_squared_terms() {
        let fi = FeatureImportance(vec![
            ("feature_0".into(), 0.1),
            ("feature_1".into(), 0.2),
            ("feature_0_sq".into(), 0.3),
            ("feature_1_sq".into(), 0.4),
        ]);
        let folded = fi.fold_squared_terms();
        assert_eq!(folded.len(), 2);
        assert!((folded.get("feature_0").unwrap() - 0.4).abs() < 1e-12);
        assert!((folded.get("feature_1").unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_importance_serializes_in_order() {
        let fi = FeatureImportance(vec![("z".into(), 0.9), ("a".into(), 0.1)]);
        let s = serde_json::to_string(&fi).unwrap();
        assert_eq!(s, r#"{"z":0.9,"a":0.1}"#);
    }

    #[test]
    fn test_clinical_names() {
        assert_eq!(clinical_name("feature_5"), Some("Hemoglobin Level"));
        assert_eq!(clinical_name("feature_10"), None);
    }
}
