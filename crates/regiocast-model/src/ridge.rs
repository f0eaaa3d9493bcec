//! Ridge Regression
//!
//! Minimizes ‖y − b − Xw‖² + α‖w‖². The intercept `b` is not penalized:
//! the design and target are centered, the penalized normal equations
//! (XᵀX + αI) w = Xᵀy are solved on the centered data, and the intercept is
//! recovered as ȳ − x̄ᵀw.

use crate::error::{ModelError, Result};
use crate::linalg::cholesky_solve;
use crate::regressor::{Regressor, validate_prediction_input, validate_training_data};
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// Ridge regression with an unpenalized intercept.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    alpha: f64,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    /// Create an unfitted model with penalty `alpha`.
    pub const fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Penalty strength.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fitted coefficients, one per design column.
    pub const fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    /// Fitted intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for RidgeRegression {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        validate_training_data(x, y)?;

        let x_mean = x.mean_axis(Axis(0)).ok_or(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let y_mean = y.mean().unwrap_or_default();

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        gram.diag_mut().mapv_inplace(|d| d + self.alpha);
        let rhs = xc.t().dot(&yc);

        let coefficients = cholesky_solve(&gram, &rhs)?;
        self.intercept = y_mean - x_mean.dot(&coefficients);
        debug!(
            features = coefficients.len(),
            intercept = self.intercept,
            "fitted ridge regression"
        );
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(ModelError::NotFitted("ridge"))?;
        validate_prediction_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relation_with_small_alpha() {
        // y = 3 + 2 x1 - x2
        let x = array![
            [0.0, 1.0],
            [1.0, 0.0],
            [2.0, 3.0],
            [3.0, 1.0],
            [4.0, 5.0],
            [5.0, 2.0]
        ];
        let y = x.map_axis(Axis(1), |r| 3.0 + 2.0 * r[0] - r[1]);

        let mut model = RidgeRegression::new(1e-8);
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert_relative_eq!(coef[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(coef[1], -1.0, epsilon = 1e-6);
        assert_relative_eq!(model.intercept(), 3.0, epsilon = 1e-6);

        let pred = model.predict(&array![[10.0, 0.0]]).unwrap();
        assert_relative_eq!(pred[0], 23.0, epsilon = 1e-5);
    }

    #[test]
    fn test_penalty_shrinks_slope_but_not_intercept() {
        let x = array![[-1.0], [0.0], [1.0]];
        let y = array![9.0, 10.0, 11.0];
        let mut model = RidgeRegression::new(2.0);
        model.fit(&x, &y).unwrap();
        // Slope = Σxy / (Σx² + α) = 2 / 4
        assert_relative_eq!(model.coefficients().unwrap()[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(model.intercept(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_is_harmless_with_penalty() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = RidgeRegression::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.coefficients().unwrap()[1], 0.0);
    }

    #[test]
    fn test_unpenalized_collinear_design_is_singular() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = RidgeRegression::new(0.0);
        assert!(matches!(model.fit(&x, &y), Err(ModelError::SingularMatrix)));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = RidgeRegression::default();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(ModelError::NotFitted("ridge"))
        ));
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let mut model = RidgeRegression::new(-1.0);
        assert!(matches!(
            model.fit(&array![[1.0]], &array![1.0]),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
