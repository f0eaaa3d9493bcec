//! CART regression tree stored as a flat node arena.

use ndarray::{Array2, ArrayView1};

/// Growth limits shared by every tree of a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Maximum depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
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

/// A fitted regression tree.
///
/// Splits minimize the summed squared error of the two children; the
/// threshold is the midpoint between adjacent distinct feature values and
/// samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `samples`.
    ///
    /// `samples` may repeat rows, as a bootstrap sample does. Inputs are
    /// assumed finite and non-empty.
    pub fn fit(x: &Array2<f64>, y: &[f64], samples: Vec<usize>, params: &TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, samples, 0, params);
        tree
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Predict a single sample.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        samples: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let id = self.nodes.len();
        let n = samples.len() as f64;
        let (sum, sum_sq) = samples
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let mean = if samples.is_empty() { 0.0 } else { sum / n };
        self.nodes.push(Node::Leaf { value: mean });

        let parent_sse = sum_sq - sum * sum / n;
        let can_split = samples.len() >= params.min_samples_split.max(2)
            && samples.len() >= 2 * params.min_samples_leaf.max(1)
            && params.max_depth.is_none_or(|d| depth < d)
            && parent_sse > 0.0;
        if !can_split {
            return id;
        }

        let Some(best) = best_split(x, y, &samples, params.min_samples_leaf.max(1)) else {
            return id;
        };
        if best.sse >= parent_sse {
            return id;
        }

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x[[i, best.feature]] <= best.threshold);
        if left_samples.is_empty() || right_samples.is_empty() {
            return id;
        }

        let left = self.grow(x, y, left_samples, depth + 1, params);
        let right = self.grow(x, y, right_samples, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }
}

/// Lowest-SSE split over every feature, scanning sorted values with running
/// sums. Earlier features win ties.
fn best_split(x: &Array2<f64>, y: &[f64], samples: &[usize], min_leaf: usize) -> Option<BestSplit> {
    let n = samples.len();
    let total_sum: f64 = samples.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = samples.iter().map(|&i| y[i] * y[i]).sum();

    let mut best: Option<BestSplit> = None;
    let mut order = samples.to_vec();
    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n.saturating_sub(1) {
            let yi = y[order[k]];
            left_sum += yi;
            left_sq += yi * yi;

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let lo = x[[order[k], feature]];
            let hi = x[[order[k + 1], feature]];
            if lo >= hi {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                let mid = lo + (hi - lo) / 2.0;
                // Adjacent floats can round the midpoint up onto `hi`
                let threshold = if mid < hi { mid } else { lo };
                best = Some(BestSplit {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_step_function_is_fit_exactly() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [5.0, 5.0, 5.0, 20.0, 20.0, 20.0];
        let tree = RegressionTree::fit(&x, &y, (0..6).collect(), &TreeParams::default());

        assert_eq!(tree.leaf_count(), 2);
        assert_relative_eq!(tree.predict_row(array![2.5].view()), 5.0);
        assert_relative_eq!(tree.predict_row(array![6.4].view()), 5.0);
        assert_relative_eq!(tree.predict_row(array![6.6].view()), 20.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0, 4.0], [2.0, 3.0], [3.0, 2.0]];
        let tree = RegressionTree::fit(&x, &[7.0; 3], vec![0, 1, 2], &TreeParams::default());
        assert_eq!(tree.node_count(), 1);
        assert_relative_eq!(tree.predict_row(array![100.0, -5.0].view()), 7.0);
    }

    #[test]
    fn test_picks_informative_feature() {
        // Feature 0 is noise, feature 1 separates the targets
        let x = array![[3.0, 0.0], [1.0, 0.0], [2.0, 1.0], [0.0, 1.0]];
        let y = [1.0, 1.0, 9.0, 9.0];
        let tree = RegressionTree::fit(&x, &y, (0..4).collect(), &TreeParams::default());
        assert_eq!(tree.leaf_count(), 2);
        assert_relative_eq!(tree.predict_row(array![3.0, 1.0].view()), 9.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0.0, 1.0, 2.0, 3.0];
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, (0..4).collect(), &params);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0.0, 0.0, 0.0, 100.0];
        let params = TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, (0..4).collect(), &params);
        // The outlier cannot be isolated in a leaf of one
        assert_relative_eq!(tree.predict_row(array![3.0].view()), 50.0);
    }

    #[test]
    fn test_duplicate_samples_from_bootstrap() {
        let x = array![[0.0], [1.0]];
        let y = [2.0, 4.0];
        let tree = RegressionTree::fit(&x, &y, vec![0, 0, 0, 1], &TreeParams::default());
        assert_relative_eq!(tree.predict_row(array![0.0].view()), 2.0);
        assert_relative_eq!(tree.predict_row(array![1.0].view()), 4.0);
    }
}
