//! Train/test splitting that respects time.
//!
//! The most recent years are held out so the models never see the future.
//! Short panels where that leaves too few rows on either side fall back to a
//! seeded random split.

use crate::error::{ModelError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regiocast_panel::FeatureRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Split thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Number of most recent years held out
    pub test_years: u32,
    /// Minimum training rows for the temporal split
    pub min_train: usize,
    /// Minimum test rows for the temporal split
    pub min_test: usize,
    /// Test share of the random fallback
    pub test_fraction: f64,
    /// Seed of the random fallback
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_years: 2,
            min_train: 50,
            min_test: 20,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// How the rows were divided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Held out the listed years
    Temporal {
        /// Test years, ascending
        test_years: Vec<i32>,
    },
    /// Seeded random fallback
    Random {
        /// Seed used for the shuffle
        seed: u64,
    },
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporal { test_years } => {
                let years: Vec<String> = test_years.iter().map(|y| y.to_string()).collect();
                write!(f, "temporal (test years {})", years.join(", "))
            }
            Self::Random { seed } => write!(f, "random (seed {seed})"),
        }
    }
}

/// Rows on each side of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Training rows
    pub train: Vec<FeatureRow>,
    /// Test rows
    pub test: Vec<FeatureRow>,
    /// How they were divided
    pub strategy: SplitStrategy,
}

/// Splits feature rows into training and test sets.
#[derive(Debug, Clone, Default)]
pub struct TimeSplitter {
    config: SplitConfig,
}

impl TimeSplitter {
    /// Create a splitter.
    pub const fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub const fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Drop rows without a target, then split.
    ///
    /// Both sides keep the input order.
    ///
    /// # Errors
    /// [`ModelError::InsufficientData`] if no row has a target or the
    /// fallback leaves one side empty, [`ModelError::InvalidParameter`] for
    /// out-of-range thresholds.
    pub fn split(&self, rows: Vec<FeatureRow>) -> Result<Split> {
        let cfg = &self.config;
        if cfg.test_years == 0 {
            return Err(ModelError::InvalidParameter(
                "test_years must be at least 1".to_string(),
            ));
        }
        if !(cfg.test_fraction > 0.0 && cfg.test_fraction < 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                cfg.test_fraction
            )));
        }

        let rows: Vec<FeatureRow> = rows
            .into_iter()
            .filter(|r| r.target_unemp_next_year.is_some())
            .collect();
        let Some(max_year) = rows.iter().map(|r| r.year).max() else {
            return Err(ModelError::InsufficientData {
                required: 2,
                actual: 0,
            });
        };

        let span = i32::try_from(cfg.test_years - 1).unwrap_or(i32::MAX);
        let cutoff = max_year.saturating_sub(span);
        let (test, train): (Vec<FeatureRow>, Vec<FeatureRow>) =
            rows.into_iter().partition(|r| r.year >= cutoff);

        if train.len() >= cfg.min_train && test.len() >= cfg.min_test {
            let mut test_years: Vec<i32> = test.iter().map(|r| r.year).collect();
            test_years.sort_unstable();
            test_years.dedup();
            info!(
                train = train.len(),
                test = test.len(),
                ?test_years,
                "temporal split"
            );
            return Ok(Split {
                train,
                test,
                strategy: SplitStrategy::Temporal { test_years },
            });
        }

        warn!(
            train = train.len(),
            test = test.len(),
            min_train = cfg.min_train,
            min_test = cfg.min_test,
            "temporal split too small, falling back to random split"
        );
        let mut rows = train;
        rows.extend(test);
        rows.sort_by(|a, b| a.geo.cmp(&b.geo).then(a.year.cmp(&b.year)));
        self.random_split(rows)
    }

    fn random_split(&self, rows: Vec<FeatureRow>) -> Result<Split> {
        let n = rows.len();
        let n_test = ((n as f64) * self.config.test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(ModelError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mut permutation: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        permutation.shuffle(&mut rng);

        let mut is_test = vec![false; n];
        for &i in &permutation[..n_test] {
            is_test[i] = true;
        }

        let (test, train): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .zip(is_test)
            .partition(|(_, t)| *t);
        let train: Vec<FeatureRow> = train.into_iter().map(|(r, _)| r).collect();
        let test: Vec<FeatureRow> = test.into_iter().map(|(r, _)| r).collect();

        info!(train = train.len(), test = test.len(), "random split");
        Ok(Split {
            train,
            test,
            strategy: SplitStrategy::Random {
                seed: self.config.seed,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(regions: usize, years: std::ops::RangeInclusive<i32>) -> Vec<FeatureRow> {
        let mut rows = Vec::new();
        for r in 0..regions {
            for year in years.clone() {
                rows.push(FeatureRow {
                    geo: format!("IT{r:02}"),
                    region: format!("Region {r}"),
                    year,
                    unemp_rate: 5.0 + r as f64,
                    gdp: None,
                    unemp_rate_lag1: None,
                    gdp_lag1: None,
                    gdp_yoy_pct: None,
                    target_unemp_next_year: Some(5.0),
                });
            }
        }
        rows
    }

    #[test]
    fn test_null_targets_are_dropped() {
        let mut rows = panel(30, 2015..=2022);
        for row in rows.iter_mut().filter(|r| r.year == 2022) {
            row.target_unemp_next_year = None;
        }
        let split = TimeSplitter::default().split(rows).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 30 * 7);
        assert_eq!(
            split.strategy,
            SplitStrategy::Temporal {
                test_years: vec![2020, 2021]
            }
        );
    }

    #[test]
    fn test_single_test_year() {
        let splitter = TimeSplitter::new(SplitConfig {
            test_years: 1,
            min_train: 1,
            min_test: 1,
            ..SplitConfig::default()
        });
        let split = splitter.split(panel(2, 2018..=2020)).unwrap();
        assert!(split.test.iter().all(|r| r.year == 2020));
        assert_eq!(split.train.len(), 4);
    }

    #[test]
    fn test_random_split_is_seeded() {
        let a = TimeSplitter::default().split(panel(3, 2018..=2022)).unwrap();
        let b = TimeSplitter::default().split(panel(3, 2018..=2022)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 3);
        assert_eq!(a.train.len(), 12);
    }

    #[test]
    fn test_no_targets() {
        let mut rows = panel(2, 2020..=2021);
        rows.iter_mut().for_each(|r| r.target_unemp_next_year = None);
        assert!(matches!(
            TimeSplitter::default().split(rows),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_single_row_cannot_be_split() {
        assert!(matches!(
            TimeSplitter::default().split(panel(1, 2020..=2020)),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_invalid_fraction() {
        let splitter = TimeSplitter::new(SplitConfig {
            test_fraction: 1.5,
            ..SplitConfig::default()
        });
        assert!(matches!(
            splitter.split(panel(1, 2020..=2021)),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_strategy_display() {
        let temporal = SplitStrategy::Temporal {
            test_years: vec![2021, 2022],
        };
        assert_eq!(temporal.to_string(), "temporal (test years 2021, 2022)");
        assert_eq!(SplitStrategy::Random { seed: 42 }.to_string(), "random (seed 42)");
    }
}
