//! Per-region temporal features.
//!
//! Lags and the next-year target are taken from the adjacent row of the same
//! region after sorting by (geo, year). A region with a missing year is not
//! gap-filled: the lag of the first year after the gap is the last observed
//! year before it.

use crate::assemble::PanelRow;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A panel row with its derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// NUTS2 region code
    pub geo: String,
    /// Region display name
    pub region: String,
    /// Calendar year
    pub year: i32,
    /// Unemployment rate in percent
    pub unemp_rate: f64,
    /// Regional GDP
    pub gdp: Option<f64>,
    /// Previous row's unemployment rate for the same region
    pub unemp_rate_lag1: Option<f64>,
    /// Previous row's GDP for the same region
    pub gdp_lag1: Option<f64>,
    /// GDP growth over the previous row, in percent
    pub gdp_yoy_pct: Option<f64>,
    /// Next row's unemployment rate for the same region
    pub target_unemp_next_year: Option<f64>,
}

impl FeatureRow {
    /// Value of a numeric column by name.
    ///
    /// Returns `None` both for a null value and for an unknown column.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "year" => Some(f64::from(self.year)),
            "unemp_rate" => Some(self.unemp_rate),
            "gdp" => self.gdp,
            "unemp_rate_lag1" => self.unemp_rate_lag1,
            "gdp_lag1" => self.gdp_lag1,
            "gdp_yoy_pct" => self.gdp_yoy_pct,
            "target_unemp_next_year" => self.target_unemp_next_year,
            _ => None,
        }
    }

    /// The underlying panel row.
    pub fn panel_row(&self) -> PanelRow {
        PanelRow {
            geo: self.geo.clone(),
            region: self.region.clone(),
            year: self.year,
            unemp_rate: self.unemp_rate,
            gdp: self.gdp,
        }
    }

    fn from_panel(row: PanelRow) -> Self {
        Self {
            geo: row.geo,
            region: row.region,
            year: row.year,
            unemp_rate: row.unemp_rate,
            gdp: row.gdp,
            unemp_rate_lag1: None,
            gdp_lag1: None,
            gdp_yoy_pct: None,
            target_unemp_next_year: None,
        }
    }
}

/// Percent change from `prior` to `current`.
///
/// `None` when either value is missing, the prior is zero, or the result is
/// not finite.
pub fn yoy_growth_pct(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (current, prior) = (current?, prior?);
    if prior == 0.0 {
        return None;
    }
    let pct = (current - prior) / prior * 100.0;
    pct.is_finite().then_some(pct)
}

/// Derive lag, growth and target columns.
///
/// Output has the same length as the input, sorted by (geo, year).
pub fn derive_features(mut panel: Vec<PanelRow>) -> Vec<FeatureRow> {
    panel.sort_by(|a, b| a.geo.cmp(&b.geo).then(a.year.cmp(&b.year)));

    let mut rows: Vec<FeatureRow> = panel.into_iter().map(FeatureRow::from_panel).collect();

    for i in 1..rows.len() {
        let (head, tail) = rows.split_at_mut(i);
        let prev = &mut head[i - 1];
        let cur = &mut tail[0];
        if prev.geo != cur.geo {
            continue;
        }
        cur.unemp_rate_lag1 = Some(prev.unemp_rate);
        cur.gdp_lag1 = prev.gdp;
        cur.gdp_yoy_pct = yoy_growth_pct(cur.gdp, prev.gdp);
        prev.target_unemp_next_year = Some(cur.unemp_rate);
    }

    let with_target = rows
        .iter()
        .filter(|r| r.target_unemp_next_year.is_some())
        .count();
    debug!(rows = rows.len(), with_target, "derived features");
    rows
}
