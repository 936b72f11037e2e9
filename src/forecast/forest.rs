// =============================================================================
// Random Forest Regressor
// =============================================================================
//
// Bootstrap-aggregated CART regression trees:
//
// - each tree is grown on `n` rows drawn with replacement,
// - each split considers a random subset of `max(1, p / 3)` features and
//   picks the threshold that minimises the children's summed squared error,
// - growth stops at `max_depth`, below `min_samples_split` rows, or when a
//   node is pure,
// - the forest predicts the mean of the tree predictions.
//
// Sampling runs on a `StdRng` seeded from the configured seed, so a given
// training set always produces the same forest.  Tree predictions never
// leave the label range seen in training.
// =============================================================================

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::forecast::regressor::{check_training_set, Regressor};

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

/// One regression tree stored as a node arena; node 0 is the root.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Best split found for one node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

/// Growth limits shared by every tree of a forest.
struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [f64],
    max_depth: usize,
    min_samples_split: usize,
    max_features: usize,
}

impl TreeBuilder<'_> {
    fn grow(&self, rows: Vec<usize>, rng: &mut StdRng) -> Tree {
        let mut tree = Tree { nodes: Vec::new() };
        self.grow_node(&mut tree, rows, 0, rng);
        tree
    }

    /// Append the subtree for `rows` and return its node index.
    fn grow_node(&self, tree: &mut Tree, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let idx = tree.nodes.len();
        let mean = rows.iter().map(|&r| self.labels[r]).sum::<f64>() / rows.len() as f64;
        tree.nodes.push(Node::Leaf(mean));

        if depth >= self.max_depth || rows.len() < self.min_samples_split.max(2) {
            return idx;
        }

        let Some(split) = self.best_split(&rows, rng) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.features[r][split.feature] <= split.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return idx;
        }

        let left = self.grow_node(tree, left_rows, depth + 1, rng);
        let right = self.grow_node(tree, right_rows, depth + 1, rng);
        tree.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&self, rows: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let width = self.features[rows[0]].len();
        let n = rows.len() as f64;

        let total: f64 = rows.iter().map(|&r| self.labels[r]).sum();
        let total_sq: f64 = rows.iter().map(|&r| self.labels[r].powi(2)).sum();
        let parent_sse = total_sq - total * total / n;
        if parent_sse <= 1e-12 {
            return None; // Pure node.
        }

        let mut best: Option<SplitCandidate> = None;
        let mut order = rows.to_vec();

        for feature in sample(rng, width, self.max_features.min(width)) {
            order.sort_by(|&a, &b| {
                self.features[a][feature].total_cmp(&self.features[b][feature])
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for (i, pair) in order.windows(2).enumerate() {
                let y = self.labels[pair[0]];
                left_sum += y;
                left_sq += y * y;

                let here = self.features[pair[0]][feature];
                let next = self.features[pair[1]][feature];
                if next <= here {
                    continue; // No threshold separates equal values.
                }

                let n_left = (i + 1) as f64;
                let n_right = n - n_left;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (here + next) / 2.0,
                        sse,
                    });
                }
            }
        }

        best.filter(|b| b.sse < parent_sse)
    }
}

/// Ensemble of bootstrap-trained regression trees.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    n_trees: usize,
    max_depth: usize,
    min_samples_split: usize,
    seed: u64,
    trees: Vec<Tree>,
    width: usize,
}

impl RandomForestRegressor {
    pub fn new(n_trees: usize, max_depth: usize, min_samples_split: usize, seed: u64) -> Self {
        Self {
            n_trees,
            max_depth,
            min_samples_split,
            seed,
            trees: Vec::new(),
            width: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<()> {
        let width = check_training_set(features, labels)?;
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter {
                name: "n_trees",
                reason: "forest needs at least one tree".to_string(),
            });
        }

        let builder = TreeBuilder {
            features,
            labels,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: (width / 3).max(1),
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = features.len();
        let trees: Vec<Tree> = (0..self.n_trees)
            .map(|_| {
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                builder.grow(rows, &mut rng)
            })
            .collect();

        debug!(
            trees = trees.len(),
            samples = n,
            features = width,
            nodes = trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            "random forest fitted"
        );

        self.trees = trees;
        self.width = width;
        Ok(())
    }

    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::NotTrained);
        }
        if features.len() != self.width {
            return Err(ForecastError::InvalidParameter {
                name: "features",
                reason: format!("expected {} values, got {}", self.width, features.len()),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}
