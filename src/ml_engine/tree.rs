//! Second-order regression tree used as the boosting weak learner.
//!
//! Nodes live in a flat arena. Split search runs over candidate features in
//! parallel (rayon) and reduces sequentially so results do not depend on
//! thread scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Loss reduction achieved by this split
        gain: f64,
        /// Hessian sum of the rows reaching this node
        cover: f64,
    },
    Leaf {
        weight: f64,
        cover: f64,
    },
}

/// Growth limits shared by every tree in an ensemble.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct GrowContext<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: TreeParams,
}

impl RegressionTree {
    /// Fit one tree to the gradient statistics of `rows`, restricted to
    /// `features`. Leaf weights already include the learning-rate shrinkage.
    pub fn fit(
        x: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        features: &[usize],
        params: TreeParams,
    ) -> Self {
        let ctx = GrowContext {
            x,
            grad,
            hess,
            features,
            params,
        };
        let mut nodes = Vec::new();
        grow(&ctx, rows, 0, &mut nodes);
        Self { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { weight, .. } => return *weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Add each split's gain to `totals[feature]`.
    pub fn accumulate_gain(&self, totals: &mut [f64]) {
        for node in &self.nodes {
            if let TreeNode::Split { feature, gain, .. } = node {
                if let Some(slot) = totals.get_mut(*feature) {
                    *slot += gain;
                }
            }
        }
    }

    /// Reject arenas `predict` cannot walk: empty trees, and children that
    /// are out of range or not strictly after their parent.
    pub fn check_structure(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                for child in [*left, *right] {
                    if child >= len || child <= idx {
                        return Err(format!("node {idx} points to child {child} (arena of {len})"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Largest feature index referenced by any split.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

fn leaf_weight(g: f64, h: f64, params: &TreeParams) -> f64 {
    -params.learning_rate * g / (h + params.reg_lambda)
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

fn grow(ctx: &GrowContext<'_>, rows: &[usize], depth: usize, nodes: &mut Vec<TreeNode>) -> usize {
    let g: f64 = rows.iter().map(|&i| ctx.grad[i]).sum();
    let h: f64 = rows.iter().map(|&i| ctx.hess[i]).sum();

    let split = if depth < ctx.params.max_depth && rows.len() >= 2 {
        best_split(ctx, rows, g, h)
    } else {
        None
    };

    let Some(split) = split else {
        let idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            weight: leaf_weight(g, h, &ctx.params),
            cover: h,
        });
        return idx;
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .partition(|&&i| ctx.x[i][split.feature] <= split.threshold);

    let node_idx = nodes.len();
    // placeholder until children are built
    nodes.push(TreeNode::Leaf { weight: 0.0, cover: h });
    let left = grow(ctx, &left_rows, depth + 1, nodes);
    let right = grow(ctx, &right_rows, depth + 1, nodes);

    nodes[node_idx] = TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        gain: split.gain,
        cover: h,
    };
    node_idx
}

fn best_split(ctx: &GrowContext<'_>, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
    let parent = score(g, h, ctx.params.reg_lambda);

    let per_feature: Vec<Option<SplitCandidate>> = ctx
        .features
        .par_iter()
        .map(|&feature| best_split_for_feature(ctx, rows, feature, g, h, parent))
        .collect();

    // Sequential reduce keeps the lowest feature index on ties.
    per_feature
        .into_iter()
        .flatten()
        .fold(None, |best: Option<SplitCandidate>, cand| match best {
            Some(b) if b.gain >= cand.gain => Some(b),
            _ => Some(cand),
        })
}

fn best_split_for_feature(
    ctx: &GrowContext<'_>,
    rows: &[usize],
    feature: usize,
    g: f64,
    h: f64,
    parent: f64,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<(f64, f64, f64)> = rows
        .iter()
        .map(|&i| (ctx.x[i][feature], ctx.grad[i], ctx.hess[i]))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let lambda = ctx.params.reg_lambda;
    let min_child = ctx.params.min_child_weight;
    let mut gl = 0.0;
    let mut hl = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for k in 0..sorted.len() - 1 {
        let (value, gi, hi) = sorted[k];
        gl += gi;
        hl += hi;
        let next = sorted[k + 1].0;
        if next <= value {
            continue;
        }
        let hr = h - hl;
        if hl < min_child || hr < min_child {
            continue;
        }
        let gr = g - gl;
        let gain = 0.5 * (score(gl, hl, lambda) + score(gr, hr, lambda) - parent);
        if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
            best = Some(SplitCandidate {
                feature,
                threshold: value + (next - value) / 2.0,
                gain,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: 3,
            learning_rate: 1.0,
            min_child_weight: 0.0,
            reg_lambda: 0.0,
        }
    }

    #[test]
    fn test_single_split_separates_gradients() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let grad = vec![1.0, 1.0, -1.0, -1.0];
        let hess = vec![1.0; 4];
        let tree = RegressionTree::fit(&x, &grad, &hess, &[0, 1, 2, 3], &[0], params());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[0.5]), -1.0);
        assert_eq!(tree.predict(&[2.5]), 1.0);
        match &tree.nodes()[0] {
            TreeNode::Split { threshold, .. } => assert_eq!(*threshold, 1.5),
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_zero_is_single_leaf() {
        let x = vec![vec![0.0], vec![1.0]];
        let mut p = params();
        p.max_depth = 0;
        let tree = RegressionTree::fit(&x, &[1.0, -1.0], &[1.0, 1.0], &[0, 1], &[0], p);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&[0.0]), 0.0);
    }

    #[test]
    fn test_constant_feature_never_splits() {
        let x = vec![vec![5.0]; 4];
        let tree = RegressionTree::fit(&x, &[1.0, -1.0, 1.0, -1.0], &[1.0; 4], &[0, 1, 2, 3], &[0], params());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_grown_trees_pass_structure_check() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let tree = RegressionTree::fit(&x, &[1.0, 1.0, -1.0, -1.0], &[1.0; 4], &[0, 1, 2, 3], &[0], params());
        assert!(tree.check_structure().is_ok());
    }

    #[test]
    fn test_structure_check_rejects_bad_arenas() {
        let empty = RegressionTree { nodes: Vec::new() };
        assert!(empty.check_structure().is_err());

        let leaf = TreeNode::Leaf { weight: 0.0, cover: 1.0 };
        let split = |left, right| TreeNode::Split {
            feature: 0,
            threshold: 0.5,
            left,
            right,
            gain: 1.0,
            cover: 2.0,
        };
        let out_of_range = RegressionTree {
            nodes: vec![split(1, 9999), leaf.clone()],
        };
        assert!(out_of_range.check_structure().is_err());

        let cycle = RegressionTree {
            nodes: vec![split(1, 2), split(0, 2), leaf.clone()],
        };
        assert!(cycle.check_structure().is_err());

        let valid = RegressionTree {
            nodes: vec![split(1, 2), leaf.clone(), leaf],
        };
        assert!(valid.check_structure().is_ok());
    }

    #[test]
    fn test_gain_attributed_to_split_feature() {
        let x = vec![vec![9.0, 0.0], vec![9.0, 1.0], vec![9.0, 2.0], vec![9.0, 3.0]];
        let tree = RegressionTree::fit(&x, &[1.0, 1.0, -1.0, -1.0], &[1.0; 4], &[0, 1, 2, 3], &[0, 1], params());
        let mut totals = vec![0.0; 2];
        tree.accumulate_gain(&mut totals);
        assert_eq!(totals[0], 0.0);
        assert!(totals[1] > 0.0);
        assert_eq!(tree.max_feature(), Some(1));
    }
}
