//! Region-year panel assembly.
//!
//! The unemployment table is the spine of the panel: every unemployment
//! observation with a usable key becomes one row, and GDP is attached where
//! the same (region, year) exists in the GDP table.

use crate::error::PanelError;
use regiocast_data::TidyTable;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// One region-year observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    /// NUTS2 region code
    pub geo: String,
    /// Region display name
    pub region: String,
    /// Calendar year
    pub year: i32,
    /// Unemployment rate in percent
    pub unemp_rate: f64,
    /// Regional GDP, absent when the GDP table has no matching row
    pub gdp: Option<f64>,
}

/// Joins the unemployment and GDP tables on (region, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelAssembler {
    /// Dimension holding the region code
    pub geo_dimension: String,
    /// Dimension holding the year
    pub time_dimension: String,
}

impl Default for PanelAssembler {
    fn default() -> Self {
        Self {
            geo_dimension: "geo".to_string(),
            time_dimension: "time".to_string(),
        }
    }
}

/// A keyed row pulled out of a tidy table.
struct Keyed {
    geo: String,
    region: String,
    year: i32,
    value: f64,
}

impl PanelAssembler {
    /// Create an assembler with custom dimension names.
    pub fn new(geo_dimension: impl Into<String>, time_dimension: impl Into<String>) -> Self {
        Self {
            geo_dimension: geo_dimension.into(),
            time_dimension: time_dimension.into(),
        }
    }

    /// Build the panel, sorted by (geo, year).
    ///
    /// # Errors
    /// [`PanelError::MissingDimension`] if either table lacks the geo or time
    /// dimension, [`PanelError::EmptyPanel`] if no unemployment row survives.
    pub fn assemble(
        &self,
        unemployment: &TidyTable,
        gdp: &TidyTable,
    ) -> Result<Vec<PanelRow>, PanelError> {
        let unemp_rows = self.keyed_rows(unemployment, "unemployment")?;
        let gdp_rows = self.keyed_rows(gdp, "gdp")?;

        let mut gdp_by_key: HashMap<(String, i32), f64> = HashMap::with_capacity(gdp_rows.len());
        for row in gdp_rows {
            if let Entry::Vacant(slot) = gdp_by_key.entry((row.geo, row.year)) {
                slot.insert(row.value);
            }
        }

        let mut seen: HashSet<(String, i32)> = HashSet::with_capacity(unemp_rows.len());
        let mut panel = Vec::with_capacity(unemp_rows.len());
        let mut duplicates = 0usize;
        for row in unemp_rows {
            let key = (row.geo, row.year);
            if !seen.insert(key.clone()) {
                duplicates += 1;
                continue;
            }
            let gdp = gdp_by_key.get(&key).copied();
            panel.push(PanelRow {
                geo: key.0,
                region: row.region,
                year: key.1,
                unemp_rate: row.value,
                gdp,
            });
        }
        if duplicates > 0 {
            warn!(duplicates, "duplicate (geo, year) rows in unemployment table, kept first");
        }

        if panel.is_empty() {
            return Err(PanelError::EmptyPanel);
        }

        panel.sort_by(|a, b| a.geo.cmp(&b.geo).then(a.year.cmp(&b.year)));

        let with_gdp = panel.iter().filter(|r| r.gdp.is_some()).count();
        info!(rows = panel.len(), with_gdp, "assembled regional panel");
        Ok(panel)
    }

    fn keyed_rows(&self, table: &TidyTable, name: &'static str) -> Result<Vec<Keyed>, PanelError> {
        let missing = |dimension: &str| PanelError::MissingDimension {
            table: name,
            dimension: dimension.to_string(),
        };
        let geo = table
            .dimension_index(&self.geo_dimension)
            .ok_or_else(|| missing(&self.geo_dimension))?;
        let time = table
            .dimension_index(&self.time_dimension)
            .ok_or_else(|| missing(&self.time_dimension))?;

        let mut dropped = 0usize;
        let rows: Vec<Keyed> = table
            .rows()
            .iter()
            .filter_map(|obs| {
                let code = obs.code(geo).map(str::trim).filter(|c| !c.is_empty());
                let year = obs.code(time).and_then(|t| t.trim().parse::<i32>().ok());
                match (code, year) {
                    (Some(code), Some(year)) => Some(Keyed {
                        geo: code.to_string(),
                        region: obs.label(geo).unwrap_or(code).to_string(),
                        year,
                        value: obs.value,
                    }),
                    _ => {
                        dropped += 1;
                        None
                    }
                }
            })
            .collect();

        if dropped > 0 {
            debug!(table = name, dropped, "dropped rows without a usable (geo, year) key");
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regiocast_data::Observation;

    fn table(rows: &[(&str, &str, &str, f64)]) -> TidyTable {
        TidyTable::from_rows(
            vec!["geo".to_string(), "time".to_string()],
            rows.iter()
                .map(|(geo, name, time, value)| Observation {
                    codes: vec![geo.to_string(), time.to_string()],
                    labels: vec![name.to_string(), time.to_string()],
                    value: *value,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_left_join_keeps_unemployment_rows() {
        let unemp = table(&[
            ("ITC2", "Valle d'Aosta", "2021", 7.0),
            ("ITC1", "Piemonte", "2022", 6.5),
            ("ITC1", "Piemonte", "2021", 7.3),
        ]);
        let gdp = table(&[
            ("ITC1", "Piemonte", "2021", 130_000.0),
            ("ITF3", "Campania", "2021", 110_000.0),
        ]);

        let panel = PanelAssembler::default().assemble(&unemp, &gdp).unwrap();
        assert_eq!(panel.len(), 3);
        assert_eq!(
            panel.iter().map(|r| (r.geo.as_str(), r.year)).collect::<Vec<_>>(),
            vec![("ITC1", 2021), ("ITC1", 2022), ("ITC2", 2021)]
        );
        assert_eq!(panel[0].gdp, Some(130_000.0));
        assert_eq!(panel[0].region, "Piemonte");
        assert_eq!(panel[1].gdp, None);
        assert_eq!(panel[2].gdp, None);
    }

    #[test]
    fn test_unparsable_years_are_dropped() {
        let unemp = table(&[("ITC1", "Piemonte", "2021", 7.3), ("ITC1", "Piemonte", "2021Q1", 7.0)]);
        let panel = PanelAssembler::default()
            .assemble(&unemp, &TidyTable::new(vec!["geo".into(), "time".into()]))
            .unwrap();
        assert_eq!(panel.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let unemp = table(&[("ITC1", "Piemonte", "2021", 7.3), ("ITC1", "Piemonte", "2021", 9.9)]);
        let panel = PanelAssembler::default().assemble(&unemp, &unemp).unwrap();
        assert_eq!(panel.len(), 1);
        assert_eq!(panel[0].unemp_rate, 7.3);
    }

    #[test]
    fn test_missing_dimension() {
        let no_time = TidyTable::new(vec!["geo".to_string()]);
        let unemp = table(&[("ITC1", "Piemonte", "2021", 7.3)]);
        let result = PanelAssembler::default().assemble(&unemp, &no_time);
        assert!(matches!(
            result,
            Err(PanelError::MissingDimension { table: "gdp", .. })
        ));
    }

    #[test]
    fn test_empty_panel() {
        let empty = TidyTable::new(vec!["geo".into(), "time".into()]);
        let result = PanelAssembler::default().assemble(&empty, &empty);
        assert!(matches!(result, Err(PanelError::EmptyPanel)));
    }
}
