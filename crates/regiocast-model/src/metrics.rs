//! Regression metrics.

use crate::error::{ModelError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Test-set metrics of one model.
///
/// Field names on disk are the upper-case metric names the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root mean squared error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Coefficient of determination
    #[serde(rename = "R2")]
    pub r2: f64,
    /// Training rows
    pub n_train: usize,
    /// Test rows
    pub n_test: usize,
}

/// MAE, RMSE and R² of `y_pred` against `y_true`.
///
/// R² is 1 − SS_res / SS_tot. When the true values are constant it is 1 for
/// a perfect prediction and 0 otherwise.
///
/// # Errors
/// [`ModelError::DimensionMismatch`] for different lengths,
/// [`ModelError::InsufficientData`] for empty input.
pub fn evaluate(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    n_train: usize,
) -> Result<RegressionMetrics> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::DimensionMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    let n = y_true.len();
    if n == 0 {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let residuals = y_true - y_pred;
    let nf = n as f64;
    let mae = residuals.mapv(f64::abs).sum() / nf;
    let ss_res = residuals.mapv(|r| r * r).sum();
    let rmse = (ss_res / nf).sqrt();

    let mean = y_true.sum() / nf;
    let ss_tot = y_true.mapv(|v| (v - mean) * (v - mean)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(RegressionMetrics {
        mae,
        rmse,
        r2,
        n_train,
        n_test: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        let m = evaluate(&y, &y, 10).unwrap();
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.n_train, 10);
        assert_eq!(m.n_test, 3);
    }

    #[test]
    fn test_known_values() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        let m = evaluate(&y_true, &y_pred, 0).unwrap();
        assert_relative_eq!(m.mae, 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.rmse, 0.375_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.r2, 0.948_608_137_044_967_9, epsilon = 1e-12);
        assert!(m.rmse >= m.mae);
    }

    #[test]
    fn test_mean_prediction_has_zero_r2() {
        let y_true = array![1.0, 2.0, 3.0];
        let m = evaluate(&y_true, &array![2.0, 2.0, 2.0], 0).unwrap();
        assert_relative_eq!(m.r2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_target() {
        let y_true = array![4.0, 4.0];
        assert_eq!(evaluate(&y_true, &array![4.0, 4.0], 0).unwrap().r2, 1.0);
        assert_eq!(evaluate(&y_true, &array![4.0, 5.0], 0).unwrap().r2, 0.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            evaluate(&array![1.0], &array![1.0, 2.0], 0),
            Err(ModelError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            evaluate(&Array1::zeros(0), &Array1::zeros(0), 0),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_serialized_keys() {
        let m = evaluate(&array![1.0, 2.0], &array![1.0, 2.0], 5).unwrap();
        let json = serde_json::to_value(m).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["MAE", "R2", "RMSE", "n_test", "n_train"]);
    }
}
