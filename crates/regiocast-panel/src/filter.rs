//! Region and dimension filtering applied to decoded tables before assembly.

use regiocast_data::TidyTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Pattern for second-level region codes: an alphabetic country prefix
/// followed by a fixed number of alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPattern {
    /// Country prefix (e.g. `IT`)
    pub prefix: String,
    /// Length of the code after the prefix
    pub suffix_len: usize,
}

impl Default for RegionPattern {
    fn default() -> Self {
        Self {
            prefix: "IT".to_string(),
            suffix_len: 2,
        }
    }
}

impl RegionPattern {
    /// Create a pattern.
    pub fn new(prefix: impl Into<String>, suffix_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            suffix_len,
        }
    }

    /// Whether `code` is a region code under this pattern.
    pub fn matches(&self, code: &str) -> bool {
        code.strip_prefix(self.prefix.as_str())
            .is_some_and(|suffix| {
                suffix.chars().count() == self.suffix_len
                    && suffix.chars().all(|c| c.is_ascii_alphanumeric())
            })
    }

    /// Keep rows whose `geo_dimension` code matches.
    ///
    /// A table without the dimension is returned unchanged.
    pub fn filter_regions(&self, table: TidyTable, geo_dimension: &str) -> TidyTable {
        let Some(idx) = table.dimension_index(geo_dimension) else {
            return table;
        };
        let before = table.len();
        let table = table.filter(|row| row.code(idx).is_some_and(|c| self.matches(c)));
        debug!(
            prefix = %self.prefix,
            kept = table.len(),
            dropped = before - table.len(),
            "filtered region codes"
        );
        table
    }
}

/// Ordered preference for the value of one extra dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionPreference {
    /// Dimension id (e.g. `unit`)
    pub dimension: String,
    /// Codes to try in order
    pub preferred: Vec<String>,
}

impl DimensionPreference {
    /// Create a preference from string slices.
    pub fn new(dimension: impl Into<String>, preferred: &[&str]) -> Self {
        Self {
            dimension: dimension.into(),
            preferred: preferred.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Pick a single code for `pref.dimension`.
///
/// Returns the first preferred code present in the table, else the first
/// code in row order, else `None` (dimension absent or table empty).
pub fn pick_preferred(table: &TidyTable, pref: &DimensionPreference) -> Option<String> {
    let available = table.distinct_codes(&pref.dimension);
    if let Some(hit) = pref
        .preferred
        .iter()
        .find(|p| available.contains(&p.as_str()))
    {
        return Some(hit.clone());
    }
    let fallback = available.first().map(|c| c.to_string());
    if let Some(code) = &fallback {
        warn!(
            dimension = %pref.dimension,
            preferred = ?pref.preferred,
            fallback = %code,
            "no preferred value present, using first available"
        );
    }
    fallback
}

/// Restrict the table to one code per preferred dimension, in list order.
pub fn select_preferred(table: TidyTable, prefs: &[DimensionPreference]) -> TidyTable {
    prefs.iter().fold(table, |table, pref| {
        match pick_preferred(&table, pref) {
            Some(code) => {
                debug!(dimension = %pref.dimension, %code, "selected dimension value");
                table.filter_code(&pref.dimension, &code)
            }
            None => table,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regiocast_data::Observation;
    use rstest::rstest;

    fn table(dims: &[&str], rows: &[&[&str]]) -> TidyTable {
        TidyTable::from_rows(
            dims.iter().map(|d| d.to_string()).collect(),
            rows.iter()
                .map(|codes| Observation {
                    codes: codes.iter().map(|c| c.to_string()).collect(),
                    labels: codes.iter().map(|c| c.to_string()).collect(),
                    value: 1.0,
                })
                .collect(),
        )
        .unwrap()
    }

    #[rstest]
    #[case("ITC1", true)]
    #[case("ITZZ", true)]
    #[case("ITF3", true)]
    #[case("FR10", false)]
    #[case("ITX", false)]
    #[case("IT", false)]
    #[case("ITC11", false)]
    #[case("IT-1", false)]
    fn test_region_pattern(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(RegionPattern::default().matches(code), expected);
    }

    #[test]
    fn test_filter_keeps_only_nuts2_codes() {
        let t = table(
            &["geo"],
            &[&["ITC1"], &["ITZZ"], &["FR10"], &["ITX"]],
        );
        let kept = RegionPattern::default().filter_regions(t, "geo");
        assert_eq!(kept.distinct_codes("geo"), vec!["ITC1", "ITZZ"]);
    }

    #[test]
    fn test_filter_without_geo_dimension_is_noop() {
        let t = table(&["time"], &[&["2020"], &["2021"]]);
        assert_eq!(RegionPattern::default().filter_regions(t, "geo").len(), 2);
    }

    #[test]
    fn test_pick_preferred_in_priority_order() {
        let t = table(&["unit"], &[&["EUR_HAB"], &["MIO_EUR"], &["PPS"]]);
        let pref = DimensionPreference::new("unit", &["MIO_EUR", "EUR_HAB"]);
        assert_eq!(pick_preferred(&t, &pref), Some("MIO_EUR".to_string()));
    }

    #[test]
    fn test_pick_preferred_falls_back_to_first_available() {
        let t = table(&["unit"], &[&["PPS"], &["THS_PER"]]);
        let pref = DimensionPreference::new("unit", &["PC"]);
        assert_eq!(pick_preferred(&t, &pref), Some("PPS".to_string()));
    }

    #[test]
    fn test_pick_preferred_absent_dimension() {
        let t = table(&["geo"], &[&["ITC1"]]);
        assert_eq!(pick_preferred(&t, &DimensionPreference::new("freq", &["A"])), None);
    }

    #[test]
    fn test_select_preferred_applies_each_dimension() {
        let t = table(
            &["freq", "unit", "geo"],
            &[
                &["A", "PC", "ITC1"],
                &["A", "THS", "ITC1"],
                &["Q", "PC", "ITC1"],
                &["A", "PC", "ITC2"],
            ],
        );
        let prefs = [
            DimensionPreference::new("freq", &["A"]),
            DimensionPreference::new("unit", &["PC"]),
            DimensionPreference::new("na_item", &["B1GQ"]),
        ];
        let selected = select_preferred(t, &prefs);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.distinct_codes("geo"), vec!["ITC1", "ITC2"]);
    }
}
