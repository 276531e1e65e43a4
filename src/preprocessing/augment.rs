//! Squared-term feature augmentation.
//!
//! `[x_0, .., x_{n-1}]` becomes `[x_0, .., x_{n-1}, x_0², .., x_{n-1}²]`.
//! Column names follow the same layout with a `_sq` suffix on the second half.

/// Append the elementwise square of `raw` after the raw values.
pub fn augment(raw: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(raw.len() * 2);
    out.extend_from_slice(raw);
    out.extend(raw.iter().map(|x| x * x));
    out
}

/// Augment every row of a matrix.
pub fn augment_rows(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|r| augment(r)).collect()
}

/// Column names for an augmented matrix built from `names`.
pub fn augmented_feature_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.as_ref().to_string())
        .chain(names.iter().map(|n| format!("{}_sq", n.as_ref())))
        .collect()
}
