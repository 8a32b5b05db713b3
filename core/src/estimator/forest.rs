//! Random-forest regressor.
//!
//! Bagged CART regression trees:
//!   - each tree is grown on a bootstrap sample (own RNG stream)
//!   - every feature is considered at every split
//!   - splits minimise the summed squared error of the two children
//!   - thresholds sit midway between adjacent distinct values
//!
//! Prediction is the mean of the tree outputs.

use super::Estimator;
use crate::{
    config::ForestConfig,
    error::{CrrError, CrrResult},
    feature_preparer::FeatureTable,
    rng::{tree_stream, TrainingRng},
};
use serde::{Deserialize, Serialize};

const SSE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` named by `sample` (may repeat).
    pub fn fit(x: &[Vec<f64>], y: &[f64], sample: &[usize], config: &ForestConfig) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample.to_vec(), 0, config);
        tree
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        sample: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
    ) -> usize {
        let idx = self.nodes.len();
        let (sum, sum_sq) = sample
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let n = sample.len() as f64;
        let mean = if sample.is_empty() { 0.0 } else { sum / n };
        self.nodes.push(Node::Leaf { value: mean });

        let parent_sse = sum_sq - sum * sum / n.max(1.0);
        let depth_exhausted = config.max_depth.is_some_and(|d| depth >= d);
        if sample.len() < config.min_samples_split || depth_exhausted || parent_sse <= SSE_EPSILON {
            return idx;
        }

        let Some(split) = best_split(x, y, &sample, config.min_samples_leaf) else {
            return idx;
        };
        if split.sse >= parent_sse - SSE_EPSILON {
            return idx;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_rows, depth + 1, config);
        let right = self.grow(x, y, right_rows, depth + 1, config);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

fn best_split(x: &[Vec<f64>], y: &[f64], sample: &[usize], min_leaf: usize) -> Option<BestSplit> {
    let n_features = x.first().map_or(0, Vec::len);
    let total = sample.len();
    let min_leaf = min_leaf.max(1);
    let mut best: Option<BestSplit> = None;

    let mut order = sample.to_vec();
    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let (total_sum, total_sq) = order
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..total {
            let prev = order[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let (lo, hi) = (x[prev][feature], x[order[k]][feature]);
            if lo == hi || k < min_leaf || total - k < min_leaf {
                continue;
            }

            let n_left = k as f64;
            let n_right = (total - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left) + (right_sq - right_sum * right_sum / n_right);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                // Adjacent floats can round the midpoint up onto `hi`.
                let mid = lo + (hi - lo) / 2.0;
                best = Some(BestSplit {
                    feature,
                    threshold: if mid < hi { mid } else { lo },
                    sse,
                });
            }
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(features: &FeatureTable, target: &[f64], config: &ForestConfig) -> CrrResult<Self> {
        if features.n_rows() == 0 {
            return Err(CrrError::InsufficientData { rows: 0 });
        }
        if features.n_rows() != target.len() {
            return Err(CrrError::schema(format!(
                "{} feature rows but {} target values",
                features.n_rows(),
                target.len()
            )));
        }
        config.validate()?;

        let x = features.rows();
        let trees = (0..config.n_estimators)
            .map(|t| {
                let mut rng = TrainingRng::new(config.seed, tree_stream(t));
                let sample = rng.bootstrap(x.len());
                RegressionTree::fit(x, target, &sample, config)
            })
            .collect();

        Ok(Self {
            n_features: features.n_cols(),
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Estimator for RandomForest {
    fn predict(&self, features: &FeatureTable) -> CrrResult<Vec<f64>> {
        if features.n_cols() != self.n_features {
            return Err(CrrError::schema(format!(
                "forest expects {} features, got {}",
                self.n_features,
                features.n_cols()
            )));
        }
        if self.trees.is_empty() {
            return Err(CrrError::schema("forest has no trees"));
        }
        let n_trees = self.trees.len() as f64;
        Ok(features
            .rows()
            .iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}
