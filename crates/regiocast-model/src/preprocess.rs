//! Design-matrix construction.
//!
//! The design matrix holds one-hot region columns (sorted region codes)
//! followed by the numeric predictors with missing values replaced by the
//! training median. Categories and medians are learned from the training
//! rows only and reused unchanged on the test rows.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};
use regiocast_panel::{FeatureRow, NUMERIC_PREDICTORS};
use tracing::{debug, warn};

/// Fitted one-hot encoder and median imputer.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    categories: Vec<String>,
    numeric_columns: Vec<&'static str>,
    medians: Vec<f64>,
}

/// Median of `values`, `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

impl Preprocessor {
    /// Learn region categories and numeric medians from training rows.
    ///
    /// # Errors
    /// [`ModelError::InsufficientData`] if `train` is empty.
    pub fn fit(train: &[FeatureRow]) -> Result<Self> {
        if train.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let mut categories: Vec<String> = train.iter().map(|r| r.geo.clone()).collect();
        categories.sort();
        categories.dedup();

        let numeric_columns = NUMERIC_PREDICTORS.to_vec();
        let medians = numeric_columns
            .iter()
            .map(|&column| {
                let mut observed: Vec<f64> = train
                    .iter()
                    .filter_map(|r| r.numeric(column))
                    .filter(|v| v.is_finite())
                    .collect();
                median(&mut observed).unwrap_or_else(|| {
                    warn!(column, "no training values, imputing 0.0");
                    0.0
                })
            })
            .collect();

        let pre = Self {
            categories,
            numeric_columns,
            medians,
        };
        debug!(
            regions = pre.categories.len(),
            columns = pre.n_features(),
            "fitted preprocessor"
        );
        Ok(pre)
    }

    /// Region codes with a one-hot column, in column order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Imputation value per numeric column.
    pub fn medians(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.numeric_columns
            .iter()
            .copied()
            .zip(self.medians.iter().copied())
    }

    /// Total number of design columns.
    pub fn n_features(&self) -> usize {
        self.categories.len() + self.numeric_columns.len()
    }

    /// Design column names: `geo_<code>` per region, then numeric columns.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("geo_{c}"))
            .chain(self.numeric_columns.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Build the design matrix for `rows`.
    ///
    /// A region not seen during fitting gets all-zero indicator columns.
    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let n_cat = self.categories.len();
        let mut x = Array2::<f64>::zeros((rows.len(), self.n_features()));
        for (i, row) in rows.iter().enumerate() {
            if let Ok(pos) = self.categories.binary_search(&row.geo) {
                x[[i, pos]] = 1.0;
            }
            for (j, (&column, &fill)) in self.numeric_columns.iter().zip(&self.medians).enumerate() {
                x[[i, n_cat + j]] = row
                    .numeric(column)
                    .filter(|v| v.is_finite())
                    .unwrap_or(fill);
            }
        }
        x
    }
}

/// Target vector for rows whose target is present.
///
/// # Errors
/// [`ModelError::NonFinite`] if a row has no target.
pub fn targets(rows: &[FeatureRow]) -> Result<Array1<f64>> {
    rows.iter()
        .map(|r| {
            r.target_unemp_next_year
                .filter(|v| v.is_finite())
                .ok_or(ModelError::NonFinite("target"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(geo: &str, year: i32, gdp: Option<f64>) -> FeatureRow {
        FeatureRow {
            geo: geo.to_string(),
            region: geo.to_string(),
            year,
            unemp_rate: 5.0,
            gdp,
            unemp_rate_lag1: None,
            gdp_lag1: None,
            gdp_yoy_pct: None,
            target_unemp_next_year: Some(6.0),
        }
    }

    #[rstest]
    #[case(vec![3.0, 1.0, 2.0], Some(2.0))]
    #[case(vec![4.0, 1.0, 2.0, 3.0], Some(2.5))]
    #[case(vec![7.0], Some(7.0))]
    #[case(vec![], None)]
    fn test_median(#[case] mut values: Vec<f64>, #[case] expected: Option<f64>) {
        assert_eq!(median(&mut values), expected);
    }

    #[test]
    fn test_one_hot_columns_are_sorted_and_unique() {
        let train = vec![row("ITF3", 2020, None), row("ITC1", 2020, None), row("ITC1", 2021, None)];
        let pre = Preprocessor::fit(&train).unwrap();
        assert_eq!(pre.categories(), ["ITC1", "ITF3"]);
        assert_eq!(pre.n_features(), 2 + NUMERIC_PREDICTORS.len());
        assert_eq!(pre.feature_names()[0], "geo_ITC1");
        assert_eq!(pre.feature_names()[2], "year");

        let x = pre.transform(&train);
        assert_eq!(x.row(0).to_vec()[..2], [0.0, 1.0]);
        assert_eq!(x.row(1).to_vec()[..2], [1.0, 0.0]);
    }

    #[test]
    fn test_unseen_region_is_all_zero() {
        let pre = Preprocessor::fit(&[row("ITC1", 2020, None)]).unwrap();
        let x = pre.transform(&[row("ITZZ", 2020, None)]);
        assert_eq!(x[[0, 0]], 0.0);
    }

    #[test]
    fn test_missing_values_use_training_median() {
        let train = vec![
            row("ITC1", 2020, Some(100.0)),
            row("ITC1", 2021, Some(300.0)),
            row("ITC1", 2022, None),
        ];
        let pre = Preprocessor::fit(&train).unwrap();
        let gdp_col = 1 + NUMERIC_PREDICTORS.iter().position(|c| *c == "gdp").unwrap();

        let x = pre.transform(&[row("ITC1", 2023, None), row("ITC1", 2023, Some(5.0))]);
        assert_eq!(x[[0, gdp_col]], 200.0);
        assert_eq!(x[[1, gdp_col]], 5.0);
    }

    #[test]
    fn test_all_missing_column_imputes_zero() {
        let pre = Preprocessor::fit(&[row("ITC1", 2020, None)]).unwrap();
        let medians: Vec<_> = pre.medians().collect();
        assert!(medians.contains(&("gdp_lag1", 0.0)));
        assert!(medians.contains(&("year", 2020.0)));
    }

    #[test]
    fn test_fit_on_empty_rows() {
        assert!(matches!(
            Preprocessor::fit(&[]),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_targets_require_values() {
        let mut rows = vec![row("ITC1", 2020, None)];
        assert_eq!(targets(&rows).unwrap().to_vec(), vec![6.0]);
        rows[0].target_unemp_next_year = None;
        assert!(targets(&rows).is_err());
    }
}
