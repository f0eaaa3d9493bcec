//! Time-aware training of the next-year unemployment models.

use crate::error::Result;
use crate::forest::{RandomForestConfig, RandomForestRegressor};
use crate::metrics::{RegressionMetrics, evaluate};
use crate::preprocess::{Preprocessor, targets};
use crate::regressor::{ModelKind, Regressor};
use crate::ridge::RidgeRegression;
use crate::split::{SplitConfig, SplitStrategy, TimeSplitter};
use regiocast_panel::FeatureRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Train/test split thresholds
    pub split: SplitConfig,
    /// Ridge penalty
    pub ridge_alpha: f64,
    /// Forest hyperparameters
    pub forest: RandomForestConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            ridge_alpha: 1.0,
            forest: RandomForestConfig::default(),
        }
    }
}

/// A test-set prediction of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// NUTS2 region code
    pub geo: String,
    /// Feature year
    pub year: i32,
    /// Region display name
    pub region: String,
    /// Unemployment rate in the feature year
    pub unemp_rate: f64,
    /// Model name
    pub model: String,
    /// Observed next-year unemployment rate
    pub y_true_next_year: f64,
    /// Predicted next-year unemployment rate
    pub y_pred_next_year: f64,
    /// Observed minus predicted
    pub residual: f64,
}

/// Everything a training run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    /// Test-set predictions, grouped by model in training order
    pub predictions: Vec<PredictionRow>,
    /// Metrics keyed by model name
    pub metrics: BTreeMap<String, RegressionMetrics>,
    /// How the rows were split
    pub strategy: SplitStrategy,
}

/// Fits every model on one shared split.
#[derive(Debug, Clone, Default)]
pub struct TimeAwareTrainer {
    config: TrainerConfig,
}

impl TimeAwareTrainer {
    /// Create a trainer.
    pub const fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn model(&self, kind: ModelKind) -> Box<dyn Regressor> {
        match kind {
            ModelKind::Ridge => Box::new(RidgeRegression::new(self.config.ridge_alpha)),
            ModelKind::RandomForest => {
                Box::new(RandomForestRegressor::new(self.config.forest.clone()))
            }
        }
    }

    /// Split, preprocess, fit both models and evaluate them on the test rows.
    ///
    /// # Errors
    /// Split failures and any model fit or predict error abort training.
    pub fn train(&self, rows: Vec<FeatureRow>) -> Result<TrainingOutcome> {
        let split = TimeSplitter::new(self.config.split.clone()).split(rows)?;

        let preprocessor = Preprocessor::fit(&split.train)?;
        let x_train = preprocessor.transform(&split.train);
        let x_test = preprocessor.transform(&split.test);
        let y_train = targets(&split.train)?;
        let y_test = targets(&split.test)?;

        let mut predictions = Vec::with_capacity(split.test.len() * ModelKind::ALL.len());
        let mut metrics = BTreeMap::new();

        for kind in ModelKind::ALL {
            let mut model = self.model(kind);
            model.fit(&x_train, &y_train)?;
            let y_pred = model.predict(&x_test)?;

            let scores = evaluate(&y_test, &y_pred, split.train.len())?;
            info!(
                model = %kind,
                mae = scores.mae,
                rmse = scores.rmse,
                r2 = scores.r2,
                "evaluated model"
            );
            metrics.insert(kind.to_string(), scores);

            predictions.extend(split.test.iter().zip(y_test.iter().zip(&y_pred)).map(
                |(row, (&truth, &pred))| PredictionRow {
                    geo: row.geo.clone(),
                    year: row.year,
                    region: row.region.clone(),
                    unemp_rate: row.unemp_rate,
                    model: kind.to_string(),
                    y_true_next_year: truth,
                    y_pred_next_year: pred,
                    residual: truth - pred,
                },
            ));
        }

        Ok(TrainingOutcome {
            predictions,
            metrics,
            strategy: split.strategy,
        })
    }
}
