//! Export of pipeline tables.
//!
//! Row tables serialize one record per row with the field names as CSV
//! headers; empty cells stand for missing values. Metrics export as a JSON
//! object keyed by model name, or as one CSV row per model.

use regiocast_model::{PredictionRow, RegressionMetrics};
use regiocast_panel::{FeatureRow, PanelRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty" | "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_to_string<'a, T, I>(records: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn rows_to_string<T: Serialize>(rows: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv_to_string(rows),
        ExportFormat::Json => Ok(serde_json::to_string(rows)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(rows)?),
    }
}

impl Exporter for Vec<PanelRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}

impl Exporter for Vec<FeatureRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}

impl Exporter for Vec<PredictionRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        rows_to_string(self, format)
    }
}

/// Metrics of every model, keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsTable(pub BTreeMap<String, RegressionMetrics>);

/// One CSV row per model.
#[derive(Debug, Serialize)]
struct MetricsRecord<'a> {
    model: &'a str,
    #[serde(rename = "MAE")]
    mae: f64,
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "R2")]
    r2: f64,
    n_train: usize,
    n_test: usize,
}

impl MetricsTable {
    /// Metrics of one model.
    pub fn get(&self, model: &str) -> Option<&RegressionMetrics> {
        self.0.get(model)
    }

    /// Model names, sorted.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no models.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Model with the lowest RMSE.
    pub fn best_by_rmse(&self) -> Option<(&str, &RegressionMetrics)> {
        self.0
            .iter()
            .min_by(|a, b| a.1.rmse.total_cmp(&b.1.rmse))
            .map(|(name, m)| (name.as_str(), m))
    }
}

impl From<BTreeMap<String, RegressionMetrics>> for MetricsTable {
    fn from(map: BTreeMap<String, RegressionMetrics>) -> Self {
        Self(map)
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (model, m) in &self.0 {
            writeln!(
                f,
                "{model}: MAE {:.3}, RMSE {:.3}, R2 {:.3} (train {}, test {})",
                m.mae, m.rmse, m.r2, m.n_train, m.n_test
            )?;
        }
        Ok(())
    }
}

impl Exporter for MetricsTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let records: Vec<MetricsRecord<'_>> = self
                    .0
                    .iter()
                    .map(|(model, m)| MetricsRecord {
                        model,
                        mae: m.mae,
                        rmse: m.rmse,
                        r2: m.r2,
                        n_train: m.n_train,
                        n_test: m.n_test,
                    })
                    .collect();
                csv_to_string(&records)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
