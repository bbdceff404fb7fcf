//! Seeded random-forest learners over dense feature rows.
//!
//! Small CART-style trees: gini splitting for classification, variance
//! reduction for regression, bootstrap resampling plus per-node feature
//! subsampling across the ensemble. Nodes live in a flat arena indexed by
//! position, so fitted models serialize cleanly and inference is a tight
//! loop with no pointer chasing.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// How many features each split considers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSubsample {
    /// Round(sqrt(p)) features per split.
    Sqrt,
    /// Every feature at every split.
    All,
}

/// Ensemble shape shared by both learners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub feature_subsample: FeatureSubsample,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 12,
            min_samples_leaf: 1,
            feature_subsample: FeatureSubsample::Sqrt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node<L> {
    Leaf(L),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tree<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Tree<L> {
    fn leaf_for(&self, row: &[f64]) -> &L {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    at = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn bootstrap(len: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..len).map(|_| rng.random_range(0..len)).collect()
}

/// Partial Fisher-Yates: `k` distinct feature indices out of `total`.
fn sample_features(total: usize, mode: FeatureSubsample, rng: &mut StdRng) -> Vec<usize> {
    let k = match mode {
        FeatureSubsample::All => total,
        FeatureSubsample::Sqrt => ((total as f64).sqrt().round() as usize).clamp(1, total),
    };
    let mut pool: Vec<usize> = (0..total).collect();
    for i in 0..k {
        let j = rng.random_range(i..total);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|c| {
            let p = c / total;
            p * p
        })
        .sum::<f64>()
}

/// Ensemble tree classifier producing per-class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<Tree<Vec<f64>>>,
    num_classes: usize,
}

impl RandomForestClassifier {
    /// Fit on dense rows with class targets in `0..num_classes` and
    /// per-sample weights (class weighting is applied through the weights).
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[usize],
        weights: &[f64],
        num_classes: usize,
        params: &ForestParams,
        seed: u64,
    ) -> Self {
        if rows.is_empty() {
            return Self {
                trees: Vec::new(),
                num_classes,
            };
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let grower = ClassGrower {
            rows,
            targets,
            weights,
            num_classes,
            params,
            num_features: rows.first().map(Vec::len).unwrap_or(0),
        };
        let trees = (0..params.num_trees)
            .map(|_| {
                let sample = bootstrap(rows.len(), &mut rng);
                let mut nodes = Vec::new();
                grower.grow(&mut nodes, sample, 0, &mut rng);
                Tree { nodes }
            })
            .collect();
        Self { trees, num_classes }
    }

    /// Mean leaf class distribution across trees; sums to 1 for a fitted
    /// forest.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.num_classes];
        for tree in &self.trees {
            for (slot, p) in acc.iter_mut().zip(tree.leaf_for(row)) {
                *slot += p;
            }
        }
        let norm = self.trees.len().max(1) as f64;
        for slot in acc.iter_mut() {
            *slot /= norm;
        }
        acc
    }

    /// Index of the highest-probability class and that probability.
    pub fn predict_with_confidence(&self, row: &[f64]) -> (usize, f64) {
        let probs = self.predict_proba(row);
        let mut best = 0;
        for (index, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = index;
            }
        }
        (best, probs[best])
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

struct ClassGrower<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    weights: &'a [f64],
    num_classes: usize,
    params: &'a ForestParams,
    num_features: usize,
}

impl ClassGrower<'_> {
    fn grow(
        &self,
        nodes: &mut Vec<Node<Vec<f64>>>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let mut counts = vec![0.0; self.num_classes];
        for &i in &indices {
            counts[self.targets[i]] += self.weights[i];
        }
        let total: f64 = counts.iter().sum();
        let pure = counts.iter().filter(|c| **c > 0.0).count() <= 1;

        if depth >= self.params.max_depth
            || indices.len() < 2 * self.params.min_samples_leaf.max(1)
            || pure
        {
            return push_leaf_distribution(nodes, counts, total);
        }

        let Some((feature, threshold)) = self.best_split(&indices, &counts, total, rng) else {
            return push_leaf_distribution(nodes, counts, total);
        };

        let (left_indices, right_indices) = partition(self.rows, &indices, feature, threshold);
        let at = nodes.len();
        nodes.push(Node::Split {
            feature,
            threshold,
            left: 0,
            right: 0,
        });
        let left = self.grow(nodes, left_indices, depth + 1, rng);
        let right = self.grow(nodes, right_indices, depth + 1, rng);
        if let Node::Split {
            left: l, right: r, ..
        } = &mut nodes[at]
        {
            *l = left;
            *r = right;
        }
        at
    }

    fn best_split(
        &self,
        indices: &[usize],
        parent_counts: &[f64],
        parent_weight: f64,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let parent_impurity = gini(parent_counts, parent_weight);
        if parent_impurity <= 0.0 || parent_weight <= 0.0 {
            return None;
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<(usize, f64)> = None;
        let mut best_score = parent_impurity;

        for feature in sample_features(self.num_features, self.params.feature_subsample, rng) {
            let mut ordered = indices.to_vec();
            ordered.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_counts = vec![0.0; self.num_classes];
            let mut left_weight = 0.0;
            for boundary in 0..ordered.len() - 1 {
                let i = ordered[boundary];
                left_counts[self.targets[i]] += self.weights[i];
                left_weight += self.weights[i];

                let here = self.rows[i][feature];
                let next = self.rows[ordered[boundary + 1]][feature];
                if next <= here {
                    continue;
                }
                if boundary + 1 < min_leaf || ordered.len() - boundary - 1 < min_leaf {
                    continue;
                }

                let right_weight = parent_weight - left_weight;
                if right_weight <= 0.0 {
                    continue;
                }
                let right_counts: Vec<f64> = parent_counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(p, l)| p - l)
                    .collect();
                let score = (left_weight * gini(&left_counts, left_weight)
                    + right_weight * gini(&right_counts, right_weight))
                    / parent_weight;
                if score + 1e-12 < best_score {
                    best_score = score;
                    best = Some((feature, (here + next) / 2.0));
                }
            }
        }
        best
    }
}

fn push_leaf_distribution(nodes: &mut Vec<Node<Vec<f64>>>, counts: Vec<f64>, total: f64) -> usize {
    let distribution = if total > 0.0 {
        counts.iter().map(|c| c / total).collect()
    } else {
        // Empty node: fall back to a uniform distribution.
        let k = counts.len().max(1) as f64;
        counts.iter().map(|_| 1.0 / k).collect()
    };
    nodes.push(Node::Leaf(distribution));
    nodes.len() - 1
}

fn partition(
    rows: &[Vec<f64>],
    indices: &[usize],
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &i in indices {
        if rows[i][feature] <= threshold {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    (left, right)
}

/// Ensemble tree regressor averaging per-tree leaf means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<Tree<f64>>,
}

impl RandomForestRegressor {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &ForestParams, seed: u64) -> Self {
        if rows.is_empty() {
            return Self { trees: Vec::new() };
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let grower = RegressionGrower {
            rows,
            targets,
            params,
            num_features: rows.first().map(Vec::len).unwrap_or(0),
        };
        let trees = (0..params.num_trees)
            .map(|_| {
                let sample = bootstrap(rows.len(), &mut rng);
                let mut nodes = Vec::new();
                grower.grow(&mut nodes, sample, 0, &mut rng);
                Tree { nodes }
            })
            .collect();
        Self { trees }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.leaf_for(row)).sum();
        sum / self.trees.len() as f64
    }
}

struct RegressionGrower<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    params: &'a ForestParams,
    num_features: usize,
}

impl RegressionGrower<'_> {
    fn grow(
        &self,
        nodes: &mut Vec<Node<f64>>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let count = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let sum_squares: f64 = indices.iter().map(|&i| self.targets[i].powi(2)).sum();
        let mean = if count > 0.0 { sum / count } else { 0.0 };
        let sse = if count > 0.0 {
            sum_squares - sum * sum / count
        } else {
            0.0
        };

        if depth >= self.params.max_depth
            || indices.len() < 2 * self.params.min_samples_leaf.max(1)
            || sse <= 1e-12
        {
            nodes.push(Node::Leaf(mean));
            return nodes.len() - 1;
        }

        let Some((feature, threshold)) = self.best_split(&indices, sse, rng) else {
            nodes.push(Node::Leaf(mean));
            return nodes.len() - 1;
        };

        let (left_indices, right_indices) = partition(self.rows, &indices, feature, threshold);
        let at = nodes.len();
        nodes.push(Node::Split {
            feature,
            threshold,
            left: 0,
            right: 0,
        });
        let left = self.grow(nodes, left_indices, depth + 1, rng);
        let right = self.grow(nodes, right_indices, depth + 1, rng);
        if let Node::Split {
            left: l, right: r, ..
        } = &mut nodes[at]
        {
            *l = left;
            *r = right;
        }
        at
    }

    fn best_split(
        &self,
        indices: &[usize],
        parent_sse: f64,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total_count = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let total_sum_squares: f64 = indices.iter().map(|&i| self.targets[i].powi(2)).sum();

        let mut best: Option<(usize, f64)> = None;
        let mut best_score = parent_sse;

        for feature in sample_features(self.num_features, self.params.feature_subsample, rng) {
            let mut ordered = indices.to_vec();
            ordered.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_count = 0.0;
            let mut left_sum = 0.0;
            let mut left_sum_squares = 0.0;
            for boundary in 0..ordered.len() - 1 {
                let i = ordered[boundary];
                let y = self.targets[i];
                left_count += 1.0;
                left_sum += y;
                left_sum_squares += y * y;

                let here = self.rows[i][feature];
                let next = self.rows[ordered[boundary + 1]][feature];
                if next <= here {
                    continue;
                }
                if boundary + 1 < min_leaf || ordered.len() - boundary - 1 < min_leaf {
                    continue;
                }

                let right_count = total_count - left_count;
                let right_sum = total_sum - left_sum;
                let right_sum_squares = total_sum_squares - left_sum_squares;

                let sse_left = left_sum_squares - left_sum * left_sum / left_count;
                let sse_right = right_sum_squares - right_sum * right_sum / right_count;
                let score = sse_left + sse_right;
                if score + 1e-9 < best_score {
                    best_score = score;
                    best = Some((feature, (here + next) / 2.0));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params(num_trees: usize) -> ForestParams {
        ForestParams {
            num_trees,
            max_depth: 6,
            min_samples_leaf: 1,
            feature_subsample: FeatureSubsample::All,
        }
    }

    /// Two clusters separable on the first feature.
    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..20 {
            rows.push(vec![0.0, i as f64]);
            targets.push(0);
            rows.push(vec![1.0, i as f64]);
            targets.push(1);
        }
        (rows, targets)
    }

    #[test]
    fn classifier_learns_a_separable_dataset() {
        let (rows, targets) = separable();
        let weights = vec![1.0; targets.len()];
        let forest =
            RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(15), 3);

        let (class, confidence) = forest.predict_with_confidence(&[0.0, 5.0]);
        assert_eq!(class, 0);
        assert!(confidence > 0.9);

        let (class, _) = forest.predict_with_confidence(&[1.0, 5.0]);
        assert_eq!(class, 1);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (rows, targets) = separable();
        let weights = vec![1.0; targets.len()];
        let forest =
            RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(9), 3);
        let probs = forest.predict_proba(&[0.0, 2.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sample_weights_tilt_unsplittable_leaves() {
        // Identical rows cannot be split; the leaf distribution must follow
        // the weights, not the raw counts.
        let rows = vec![vec![1.0]; 10];
        let targets: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let weights: Vec<f64> = targets
            .iter()
            .map(|&t| if t == 1 { 3.0 } else { 1.0 })
            .collect();
        let forest =
            RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(7), 1);

        let (class, confidence) = forest.predict_with_confidence(&[1.0]);
        assert_eq!(class, 1);
        assert!(confidence > 0.6);
    }

    #[test]
    fn same_seed_yields_identical_forests() {
        let (rows, targets) = separable();
        let weights = vec![1.0; targets.len()];
        let a = RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(11), 9);
        let b = RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(11), 9);
        assert_eq!(a, b);
    }

    #[test]
    fn regressor_recovers_piecewise_means() {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..20 {
            rows.push(vec![0.0, i as f64]);
            targets.push(10.0);
            rows.push(vec![1.0, i as f64]);
            targets.push(20.0);
        }
        let forest = RandomForestRegressor::fit(&rows, &targets, &small_params(15), 5);
        assert!((forest.predict(&[0.0, 3.0]) - 10.0).abs() < 1e-6);
        assert!((forest.predict(&[1.0, 3.0]) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn fitted_classifier_round_trips_through_json() {
        let (rows, targets) = separable();
        let weights = vec![1.0; targets.len()];
        let forest =
            RandomForestClassifier::fit(&rows, &targets, &weights, 2, &small_params(5), 2);

        let encoded = serde_json::to_string(&forest).unwrap();
        let decoded: RandomForestClassifier = serde_json::from_str(&encoded).unwrap();
        assert_eq!(forest, decoded);
        assert_eq!(
            forest.predict_proba(&[0.0, 1.0]),
            decoded.predict_proba(&[0.0, 1.0])
        );
    }
}
