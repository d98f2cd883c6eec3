//! CART (Classification and Regression Tree) builder
//!
//! Implements deterministic exact-greedy regression tree construction with
//! squared-error impurity. Candidate thresholds are midpoints between
//! consecutive distinct feature values; on equal gain the earlier
//! `(feature, threshold)` candidate wins.

use serde::{Deserialize, Serialize};

/// Training parameters for a single tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A regression tree node (internal or leaf)
///
/// Leaves have `feature_idx == -1` and carry the mean target in `leaf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub feature_idx: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub leaf: Option<f64>,
}

impl Node {
    fn leaf(value: f64) -> Self {
        Self {
            feature_idx: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx < 0 || self.leaf.is_some()
    }
}

/// A single regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Evaluate this tree on a feature vector
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0; // Invalid tree structure
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0; // Invalid feature index
            };

            idx = if value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Split candidate with its impurity decrease
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Sum of squared errors around the mean, from running sums
fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / n as f64).max(0.0)
}

/// Smallest impurity decrease that counts as a real split
const MIN_GAIN: f64 = 1e-12;

/// Build a regression tree using exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    /// `features` and `targets` are row-aligned; every row holds the same
    /// number of features.
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: TreeConfig) -> Self {
        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree over the given sample indices (repeats allowed).
    ///
    /// Returns the tree and the total impurity decrease credited to each
    /// feature.
    pub fn build(&self, indices: &[usize]) -> (Tree, Vec<f64>) {
        let mut nodes = Vec::new();
        let mut importances = vec![0.0; self.feature_count];

        if !indices.is_empty() {
            self.build_node(indices, 0, &mut nodes, &mut importances);
        }

        (Tree { nodes }, importances)
    }

    /// Recursively build tree nodes
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        importances: &mut [f64],
    ) -> i32 {
        let current_idx = nodes.len();
        let (sum, sum_sq) = self.sums(indices);
        let leaf_value = sum / indices.len() as f64;
        let parent_sse = sse(sum, sum_sq, indices.len());

        // Check stopping conditions
        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || parent_sse <= MIN_GAIN
        {
            nodes.push(Node::leaf(leaf_value));
            return current_idx as i32;
        }

        let Some(split) = self.find_best_split(indices, parent_sse) else {
            nodes.push(Node::leaf(leaf_value));
            return current_idx as i32;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.features[i][split.feature_idx] <= split.threshold);

        importances[split.feature_idx] += split.gain;

        // Reserve space for current node
        nodes.push(Node {
            feature_idx: split.feature_idx as i32,
            threshold: split.threshold,
            left: -1,
            right: -1,
            leaf: None,
        });

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, importances);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, importances);

        nodes[current_idx].left = left_idx;
        nodes[current_idx].right = right_idx;

        current_idx as i32
    }

    /// Find best split using exact-greedy sweep over sorted values
    fn find_best_split(&self, indices: &[usize], parent_sse: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let (total, total_sq) = self.sums(indices);
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature_idx in 0..self.feature_count {
            order.sort_by(|&a, &b| {
                self.features[a][feature_idx].total_cmp(&self.features[b][feature_idx])
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for pos in 0..n - 1 {
                let y = self.targets[order[pos]];
                left_sum += y;
                left_sq += y * y;

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let here = self.features[order[pos]][feature_idx];
                let next = self.features[order[pos + 1]][feature_idx];
                if here == next {
                    continue;
                }

                let child_sse = sse(left_sum, left_sq, left_n)
                    + sse(total - left_sum, total_sq - left_sq, right_n);
                let gain = parent_sse - child_sse;

                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Sum and sum of squares of the targets
    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let y = self.targets[i];
            (s + y, sq + y * y)
        })
    }
}
