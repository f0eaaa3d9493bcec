//! Run configuration.
//!
//! Every field has a default, so a JSON config file only needs the values it
//! changes:
//!
//! ```json
//! { "root": "/srv/regiocast", "trainer": { "forest": { "n_estimators": 100 } } }
//! ```

use crate::error::{PipelineError, Result};
use regiocast_data::eurostat::DatasetRequest;
use regiocast_model::TrainerConfig;
use regiocast_panel::{DimensionPreference, RegionPattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One Eurostat dataset and how to narrow it to a single series per region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Dataset code, e.g. `tgs00010`
    pub code: String,
    /// Label language
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Preferred codes of the non-key dimensions, applied in order
    #[serde(default)]
    pub preferences: Vec<DimensionPreference>,
}

fn default_lang() -> String {
    "EN".to_string()
}

impl DatasetSpec {
    /// Regional unemployment rate, annual, in percent.
    pub fn unemployment() -> Self {
        Self {
            code: "tgs00010".to_string(),
            lang: default_lang(),
            preferences: vec![
                DimensionPreference::new("freq", &["A"]),
                DimensionPreference::new("unit", &["PC"]),
            ],
        }
    }

    /// Regional GDP at current market prices.
    pub fn gdp() -> Self {
        Self {
            code: "nama_10r_2gdp".to_string(),
            lang: default_lang(),
            preferences: vec![
                DimensionPreference::new("na_item", &["B1GQ"]),
                DimensionPreference::new("unit", &["MIO_EUR", "EUR_HAB"]),
                DimensionPreference::new("freq", &["A"]),
            ],
        }
    }

    /// Request for this dataset.
    pub fn request(&self) -> DatasetRequest {
        DatasetRequest::new(self.code.clone()).with_lang(self.lang.clone())
    }
}

/// Artifact locations, relative to the run root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Raw tidy tables
    pub raw_dir: PathBuf,
    /// Panel and feature tables
    pub processed_dir: PathBuf,
    /// Predictions and metrics
    pub models_dir: PathBuf,
    /// Optional NUTS2 boundary document
    pub boundaries: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            models_dir: PathBuf::from("models"),
            boundaries: PathBuf::from("data/geo/italy_nuts2.geojson"),
        }
    }
}

/// Full configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory all relative artifact paths resolve against
    pub root: PathBuf,
    /// Artifact layout
    pub paths: ArtifactPaths,
    /// Unemployment dataset
    pub unemployment: DatasetSpec,
    /// GDP dataset
    pub gdp: DatasetSpec,
    /// Which geo codes count as regions
    pub region: RegionPattern,
    /// Split and model settings
    pub trainer: TrainerConfig,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Cached documents older than this are fetched again
    pub cache_max_age_days: i64,
    /// Regions listed in the report's forecast ranking
    pub report_top: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            paths: ArtifactPaths::default(),
            unemployment: DatasetSpec::unemployment(),
            gdp: DatasetSpec::gdp(),
            region: RegionPattern::default(),
            trainer: TrainerConfig::default(),
            request_timeout_secs: 60,
            cache_max_age_days: 7,
            report_top: 10,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration.
    ///
    /// # Errors
    /// [`PipelineError::Config`] if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// [`PipelineError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Replace the run root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Reject settings no stage can work with.
    ///
    /// # Errors
    /// [`PipelineError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.unemployment.code.trim().is_empty() || self.gdp.code.trim().is_empty() {
            return Err(PipelineError::Config("dataset code is empty".to_string()));
        }
        if self.region.prefix.is_empty() {
            return Err(PipelineError::Config("region prefix is empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// HTTP request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// `unemployment_raw.csv`
    pub fn unemployment_raw_path(&self) -> PathBuf {
        self.resolve(&self.paths.raw_dir).join("unemployment_raw.csv")
    }

    /// `gdp_raw.csv`
    pub fn gdp_raw_path(&self) -> PathBuf {
        self.resolve(&self.paths.raw_dir).join("gdp_raw.csv")
    }

    /// `regional_panel.csv`
    pub fn panel_path(&self) -> PathBuf {
        self.resolve(&self.paths.processed_dir)
            .join("regional_panel.csv")
    }

    /// `regional_panel_features.csv`
    pub fn features_path(&self) -> PathBuf {
        self.resolve(&self.paths.processed_dir)
            .join("regional_panel_features.csv")
    }

    /// `predictions.csv`
    pub fn predictions_path(&self) -> PathBuf {
        self.resolve(&self.paths.models_dir).join("predictions.csv")
    }

    /// `metrics.json`
    pub fn metrics_path(&self) -> PathBuf {
        self.resolve(&self.paths.models_dir).join("metrics.json")
    }

    /// Boundary document.
    pub fn boundaries_path(&self) -> PathBuf {
        self.resolve(&self.paths.boundaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_datasets() {
        let config = PipelineConfig::default();
        assert_eq!(config.unemployment.code, "tgs00010");
        assert_eq!(config.gdp.code, "nama_10r_2gdp");
        assert_eq!(
            config.gdp.preferences[1].preferred,
            vec!["MIO_EUR".to_string(), "EUR_HAB".to_string()]
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "root": "/tmp/run", "trainer": { "forest": { "n_estimators": 25 } } }"#,
        )
        .unwrap();
        assert_eq!(config.trainer.forest.n_estimators, 25);
        assert_eq!(config.trainer.forest.seed, 42);
        assert_eq!(config.trainer.split.min_train, 50);
        assert_eq!(
            config.metrics_path(),
            PathBuf::from("/tmp/run/models/metrics.json")
        );
    }

    #[test]
    fn test_dataset_spec_lang_defaults() {
        let spec: DatasetSpec = serde_json::from_str(r#"{ "code": "tgs00010" }"#).unwrap();
        assert_eq!(spec.lang, "EN");
        assert!(spec.preferences.is_empty());
    }

    #[test]
    fn test_absolute_paths_ignore_root() {
        let mut config = PipelineConfig::default().with_root("/data/run");
        config.paths.boundaries = PathBuf::from("/srv/geo/nuts2.geojson");
        assert_eq!(
            config.boundaries_path(),
            PathBuf::from("/srv/geo/nuts2.geojson")
        );
        assert_eq!(
            config.unemployment_raw_path(),
            PathBuf::from("/data/run/data/raw/unemployment_raw.csv")
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{ "request_timeout_secs": 0 }"#),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(PipelineError::Config(_))
        ));
    }
}
