//! Common interface of the trained models.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Models the trainer fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// L2-penalized linear regression
    Ridge,
    /// Bagged regression trees
    RandomForest,
}

impl ModelKind {
    /// Every model, in training order.
    pub const ALL: [Self; 2] = [Self::Ridge, Self::RandomForest];

    /// Name used in artifacts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ridge => "ridge",
            Self::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regression model over a dense design matrix.
pub trait Regressor {
    /// Model name used in artifacts
    fn name(&self) -> &'static str;

    /// Fit the model
    ///
    /// # Arguments
    /// * `x` - Design matrix, one row per sample
    /// * `y` - Target per row of `x`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Shared input checks for [`Regressor::fit`].
pub(crate) fn validate_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(ModelError::NonFinite("design matrix"));
    }
    if !y.iter().all(|v| v.is_finite()) {
        return Err(ModelError::NonFinite("target"));
    }
    Ok(())
}

/// Shared input checks for [`Regressor::predict`].
pub(crate) fn validate_prediction_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(ModelError::DimensionMismatch {
            expected: n_features,
            actual: x.ncols(),
        });
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(ModelError::NonFinite("design matrix"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_kind_names() {
        assert_eq!(ModelKind::Ridge.to_string(), "ridge");
        assert_eq!(ModelKind::RandomForest.as_str(), "random_forest");
        assert_eq!(
            serde_json::to_string(&ModelKind::RandomForest).unwrap(),
            "\"random_forest\""
        );
    }

    #[test]
    fn test_validate_training_data() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(validate_training_data(&x, &array![1.0, 2.0]).is_ok());
        assert!(matches!(
            validate_training_data(&x, &array![1.0]),
            Err(ModelError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            validate_training_data(&x, &array![1.0, f64::NAN]),
            Err(ModelError::NonFinite("target"))
        ));
        assert!(matches!(
            validate_training_data(&Array2::zeros((0, 2)), &Array1::zeros(0)),
            Err(ModelError::InsufficientData { .. })
        ));
    }
}
