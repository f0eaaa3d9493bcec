//! Feature table columns.
//!
//! Names match the CSV headers the dashboard reads.

/// All columns of the feature table, in CSV order.
pub const FEATURE_COLUMNS: &[&str] = &[
    "geo",
    "region",
    "year",
    "unemp_rate",
    "gdp",
    "unemp_rate_lag1",
    "gdp_lag1",
    "gdp_yoy_pct",
    "target_unemp_next_year",
];

/// Numeric predictors, in design-matrix order.
pub const NUMERIC_PREDICTORS: &[&str] = &[
    "year",
    "unemp_rate",
    "gdp",
    "unemp_rate_lag1",
    "gdp_lag1",
    "gdp_yoy_pct",
];
