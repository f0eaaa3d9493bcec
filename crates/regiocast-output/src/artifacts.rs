//! Readers for the files a run leaves behind.

use crate::export::{ExportError, MetricsTable};
use regiocast_model::PredictionRow;
use regiocast_panel::{FeatureRow, PanelRow};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Deserialize every record of a headed CSV stream.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] for malformed records.
pub fn read_records<T, R>(reader: R) -> Result<Vec<T>, ExportError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(ExportError::from)
}

fn read_csv_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExportError> {
    let rows: Vec<T> = read_records(File::open(path)?)?;
    debug!(path = %path.display(), rows = rows.len(), "read artifact");
    Ok(rows)
}

/// Read `regional_panel.csv`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_panel(path: &Path) -> Result<Vec<PanelRow>, ExportError> {
    read_csv_file(path)
}

/// Read `regional_panel_features.csv`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_features(path: &Path) -> Result<Vec<FeatureRow>, ExportError> {
    read_csv_file(path)
}

/// Read `predictions.csv`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn read_predictions(path: &Path) -> Result<Vec<PredictionRow>, ExportError> {
    read_csv_file(path)
}

/// Read `metrics.json`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a metrics object.
pub fn read_metrics(path: &Path) -> Result<MetricsTable, ExportError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Region keys of the NUTS2 boundary document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryIndex {
    regions: BTreeSet<String>,
}

impl BoundaryIndex {
    /// Collect region keys from a GeoJSON `FeatureCollection`.
    ///
    /// The key is `properties.NUTS_ID`, falling back to the feature `id`.
    /// Features with neither are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidFormat`] if there is no `features` array.
    pub fn from_geojson(document: &serde_json::Value) -> Result<Self, ExportError> {
        let features = document
            .get("features")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| ExportError::InvalidFormat("GeoJSON without features".to_string()))?;

        let mut regions = BTreeSet::new();
        let mut skipped = 0usize;
        for feature in features {
            let key = feature
                .get("properties")
                .and_then(|p| p.get("NUTS_ID"))
                .and_then(serde_json::Value::as_str)
                .or_else(|| feature.get("id").and_then(serde_json::Value::as_str));
            match key {
                Some(k) => {
                    regions.insert(k.to_string());
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "boundary features without a region key");
        }
        Ok(Self { regions })
    }

    /// Load the boundary document, or `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ExportError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "boundary document not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let document: serde_json::Value = serde_json::from_str(&text)?;
        Self::from_geojson(&document).map(Some)
    }

    /// Keep only regions whose code starts with `prefix`.
    pub fn retain_prefix(mut self, prefix: &str) -> Self {
        self.regions.retain(|r| r.starts_with(prefix));
        self
    }

    /// Whether a boundary exists for `geo`.
    pub fn contains(&self, geo: &str) -> bool {
        self.regions.contains(geo)
    }

    /// Region keys, sorted.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no region was found.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Codes among `geos` without a boundary, sorted and deduplicated.
    pub fn missing<'a, I>(&self, geos: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        geos.into_iter()
            .filter(|g| !self.contains(g))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
