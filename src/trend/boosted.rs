//! Gradient-boosted regression trees.
//!
//! Least-squares boosting over shallow CART trees: every stage fits a tree
//! to the current residuals and adds it with shrinkage `learning_rate`.
//! Row subsampling (stochastic boosting) is driven by a seeded RNG so a
//! given configuration always produces the same ensemble.

use crate::error::{Result, UrbanError};
use rand::prelude::*;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for the boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting stages.
    pub n_estimators: usize,
    /// Shrinkage applied to each tree.
    pub learning_rate: f64,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Minimum number of samples in a leaf.
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) per stage.
    pub subsample: f64,
    /// Seed for row subsampling.
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Use stochastic boosting with the given row fraction.
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(UrbanError::InvalidParameter(
                "n_estimators must be positive".into(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(UrbanError::InvalidParameter(
                "learning_rate must be in (0, 1]".into(),
            ));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(UrbanError::InvalidParameter(
                "subsample must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART regression tree stored as a node arena.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree on the rows selected by `indices`.
    fn fit(
        rows: &[Vec<f64>],
        target: &[f64],
        indices: &[usize],
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, target, indices.to_vec(), 0, max_depth, min_samples_leaf.max(1));
        tree
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        target: &[f64],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        min_leaf: usize,
    ) -> usize {
        let id = self.nodes.len();
        let leaf_value = indices.iter().map(|&i| target[i]).sum::<f64>() / indices.len() as f64;
        self.nodes.push(Node::Leaf(leaf_value));

        if depth >= max_depth || indices.len() < 2 * min_leaf {
            return id;
        }

        let Some((feature, threshold)) = best_split(rows, target, &indices, min_leaf) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][feature] <= threshold);

        let left = self.grow(rows, target, left_idx, depth + 1, max_depth, min_leaf);
        let right = self.grow(rows, target, right_idx, depth + 1, max_depth, min_leaf);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Find the split minimizing the summed squared error of both children.
fn best_split(
    rows: &[Vec<f64>],
    target: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n_features = rows.first()?.len();
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| target[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| target[i] * target[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut order = indices.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| {
            rows[a][feature]
                .partial_cmp(&rows[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let y = target[order[k]];
            left_sum += y;
            left_sq += y * y;

            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            let here = rows[order[k]][feature];
            let next = rows[order[k + 1]][feature];
            if here == next {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.map_or(true, |(_, _, b)| sse < b) {
                best = Some((feature, (here + next) / 2.0, sse));
            }
        }
    }

    best.filter(|&(_, _, sse)| sse < parent_sse - 1e-12)
        .map(|(f, t, _)| (f, t))
}

/// Least-squares gradient boosting regressor.
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    config: BoostingConfig,
    base_prediction: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostedRegressor {
    /// Fit the ensemble on a row-major feature matrix.
    pub fn fit(config: &BoostingConfig, rows: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        config.validate()?;
        if rows.is_empty() {
            return Err(UrbanError::EmptyData);
        }
        if rows.len() != target.len() {
            return Err(UrbanError::DimensionMismatch {
                expected: rows.len(),
                got: target.len(),
            });
        }
        let n_features = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(UrbanError::DimensionMismatch {
                expected: n_features,
                got: bad.len(),
            });
        }
        if target.iter().any(|v| !v.is_finite()) {
            return Err(UrbanError::ComputationError(
                "non-finite value in boosting target".into(),
            ));
        }

        let n = rows.len();
        let base_prediction = target.iter().sum::<f64>() / n as f64;
        let mut current = vec![base_prediction; n];
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = ((n as f64 * config.subsample).round() as usize).clamp(1, n);
        let all: Vec<usize> = (0..n).collect();

        for _ in 0..config.n_estimators {
            let residuals: Vec<f64> = target.iter().zip(&current).map(|(y, f)| y - f).collect();

            let indices = if sample_size < n {
                let mut sample: Vec<usize> = all.choose_multiple(&mut rng, sample_size).copied().collect();
                sample.sort_unstable();
                sample
            } else {
                all.clone()
            };

            let tree = RegressionTree::fit(
                rows,
                &residuals,
                &indices,
                config.max_depth,
                config.min_samples_leaf,
            );
            for (f, row) in current.iter_mut().zip(rows) {
                *f += config.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            config: config.clone(),
            base_prediction,
            trees,
            n_features,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base_prediction
            + self
                .trees
                .iter()
                .map(|t| self.config.learning_rate * t.predict(row))
                .sum::<f64>()
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
