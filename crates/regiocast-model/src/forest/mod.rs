//! Random Forest Regression
//!
//! Averages regression trees grown on bootstrap samples of the training
//! rows. Every split considers all features. Tree `i` draws its bootstrap
//! sample from a generator seeded with `seed + i`, so a fitted forest does
//! not depend on how rayon schedules the trees.

pub mod tree;

pub use tree::{RegressionTree, TreeParams};

use crate::error::{ModelError, Result};
use crate::regressor::{Regressor, validate_prediction_input, validate_training_data};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Base seed for bootstrap sampling
    pub seed: u64,
    /// Maximum tree depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 400,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl RandomForestConfig {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Bagged regression trees.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: RandomForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(RandomForestConfig::default())
    }
}

impl RandomForestRegressor {
    /// Create an unfitted forest.
    pub const fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Hyperparameters.
    pub const fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    /// Fitted trees, in seed order.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

/// Draw `n` row indices with replacement.
fn bootstrap_sample(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.config.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        validate_training_data(x, y)?;

        let n = x.nrows();
        let targets = y.to_vec();
        let params = self.config.tree_params();
        let seed = self.config.seed;

        self.trees = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let samples = bootstrap_sample(n, seed.wrapping_add(i as u64));
                RegressionTree::fit(x, &targets, samples, &params)
            })
            .collect();
        self.n_features = x.ncols();

        debug!(
            trees = self.trees.len(),
            mean_leaves = self.trees.iter().map(|t| t.leaf_count()).sum::<usize>() as f64
                / self.trees.len() as f64,
            "fitted random forest"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted("random_forest"));
        }
        validate_prediction_input(x, self.n_features)?;

        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}
