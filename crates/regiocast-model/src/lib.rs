#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/regiocast/regiocast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod forest;
pub mod linalg;
pub mod metrics;
pub mod preprocess;
pub mod regressor;
pub mod ridge;
pub mod split;
pub mod trainer;

// Re-export main types
pub use error::{ModelError, Result};
pub use forest::{RandomForestConfig, RandomForestRegressor, RegressionTree};
pub use metrics::{RegressionMetrics, evaluate};
pub use preprocess::Preprocessor;
pub use regressor::{ModelKind, Regressor};
pub use ridge::RidgeRegression;
pub use split::{Split, SplitConfig, SplitStrategy, TimeSplitter};
pub use trainer::{PredictionRow, TimeAwareTrainer, TrainerConfig, TrainingOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
