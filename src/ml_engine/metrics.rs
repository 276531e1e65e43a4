//! Classification metrics
//!
//! Precision, recall and F1 are support-weighted averages over the classes
//! present in `y_true`; an undefined ratio counts as 0. ROC-AUC uses the
//! Mann-Whitney rank statistic with average ranks for ties and is only
//! reported when both classes appear in `y_true`.

use crate::types::ClassificationMetrics;

pub fn evaluate(y_true: &[u8], y_pred: &[u8], positive_proba: &[f64]) -> ClassificationMetrics {
    let n = y_true.len();
    if n == 0 {
        return ClassificationMetrics::default();
    }

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    let accuracy = correct as f64 / n as f64;

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    for class in [0u8, 1u8] {
        let support = y_true.iter().filter(|&&t| t == class).count();
        if support == 0 {
            continue;
        }
        let (p, r, f) = class_scores(y_true, y_pred, class);
        let weight = support as f64 / n as f64;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    let both_classes = y_true.contains(&0) && y_true.contains(&1);
    let roc_auc = both_classes.then(|| roc_auc(positive_proba, y_true));

    ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        roc_auc,
    }
}

fn class_scores(y_true: &[u8], y_pred: &[u8], class: u8) -> (f64, f64, f64) {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == class, p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}

/// Area under the ROC curve. Expects both classes in `labels`.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> f64 {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // 1-based average ranks
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let n_pos = labels.iter().filter(|&&l| l == 1).count() as f64;
    let n_neg = labels.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }
    let pos_rank_sum: f64 = ranks.iter().zip(labels).filter(|(_, &l)| l == 1).map(|(r, _)| r).sum();
    (pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}
