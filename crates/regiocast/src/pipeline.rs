//! Pipeline stages.
//!
//! Each stage takes the previous stage's output by value and the run
//! configuration by reference. The file-backed variants read and write the
//! artifacts under the configured root so stages can run separately.

use crate::config::{DatasetSpec, PipelineConfig};
use crate::error::Result;
use regiocast_data::{Cube, JsonStatDocument, TidyTable};
use regiocast_model::{TimeAwareTrainer, TrainingOutcome};
use regiocast_output::{
    BoundaryIndex, ExportFormat, Exporter, MetricsSummary, MetricsTable, ReportBuilder, RunReport,
    read_features, read_metrics, read_predictions,
};
use regiocast_panel::{
    FeatureRow, PanelAssembler, PanelRow, RegionPattern, derive_features, select_preferred,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Geo dimension of the Eurostat regional datasets.
pub const GEO_DIMENSION: &str = "geo";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Decode a fetched document and narrow it to one series per region.
///
/// Keeps only region codes matching `region`, then applies the dataset's
/// dimension preferences in order.
///
/// # Errors
/// Structural problems in the document are fatal.
pub fn prepare_raw_table(
    document: JsonStatDocument,
    spec: &DatasetSpec,
    region: &RegionPattern,
) -> Result<TidyTable> {
    let decoded = Cube::try_from(document)?.decode()?;
    let decoded_rows = decoded.len();
    let regional = region.filter_regions(decoded, GEO_DIMENSION);
    let table = select_preferred(regional, &spec.preferences);
    info!(
        dataset = %spec.code,
        decoded = decoded_rows,
        kept = table.len(),
        "prepared raw table"
    );
    Ok(table)
}

/// Write both raw tables.
///
/// # Errors
/// Fails if a file cannot be written.
pub fn write_raw_tables(
    config: &PipelineConfig,
    unemployment: &TidyTable,
    gdp: &TidyTable,
) -> Result<()> {
    for (table, path) in [
        (unemployment, config.unemployment_raw_path()),
        (gdp, config.gdp_raw_path()),
    ] {
        ensure_parent(&path)?;
        table.to_csv_file(&path)?;
        debug!(path = %path.display(), rows = table.len(), "wrote raw table");
    }
    Ok(())
}

/// Read both raw tables back.
///
/// # Errors
/// Fails if a file is missing or malformed.
pub fn load_raw_tables(config: &PipelineConfig) -> Result<(TidyTable, TidyTable)> {
    let unemployment = TidyTable::from_csv_file(config.unemployment_raw_path())?;
    let gdp = TidyTable::from_csv_file(config.gdp_raw_path())?;
    Ok((unemployment, gdp))
}

/// Join the raw tables into the region-year panel.
///
/// # Errors
/// Missing geo or time dimensions and an empty panel are fatal.
pub fn build_panel(unemployment: &TidyTable, gdp: &TidyTable) -> Result<Vec<PanelRow>> {
    Ok(PanelAssembler::default().assemble(unemployment, gdp)?)
}

/// Build panel and features from the raw CSVs and write both tables.
///
/// # Errors
/// Fails on unreadable raw tables, assembly errors or write errors.
pub fn build_processed(config: &PipelineConfig) -> Result<Vec<FeatureRow>> {
    let (unemployment, gdp) = load_raw_tables(config)?;
    let panel = build_panel(&unemployment, &gdp)?;
    panel.export_to_file(&config.panel_path(), ExportFormat::Csv)?;

    let features = derive_features(panel);
    features.export_to_file(&config.features_path(), ExportFormat::Csv)?;
    info!(
        rows = features.len(),
        path = %config.features_path().display(),
        "wrote feature table"
    );
    Ok(features)
}

/// Train both models on the feature rows.
///
/// # Errors
/// Split and model errors are fatal.
pub fn train(config: &PipelineConfig, features: Vec<FeatureRow>) -> Result<TrainingOutcome> {
    Ok(TimeAwareTrainer::new(config.trainer.clone()).train(features)?)
}

/// Write predictions and metrics.
///
/// # Errors
/// Fails if an artifact cannot be written.
pub fn write_model_artifacts(config: &PipelineConfig, outcome: &TrainingOutcome) -> Result<()> {
    outcome
        .predictions
        .export_to_file(&config.predictions_path(), ExportFormat::Csv)?;
    MetricsTable::from(outcome.metrics.clone())
        .export_to_file(&config.metrics_path(), ExportFormat::PrettyJson)?;
    info!(
        predictions = outcome.predictions.len(),
        models = outcome.metrics.len(),
        "wrote model artifacts"
    );
    Ok(())
}

/// Train from the features CSV and write the model artifacts.
///
/// # Errors
/// Fails on an unreadable features table, training errors or write errors.
pub fn train_from_features(config: &PipelineConfig) -> Result<TrainingOutcome> {
    let features = read_features(&config.features_path())?;
    let outcome = train(config, features)?;
    write_model_artifacts(config, &outcome)?;
    Ok(outcome)
}

/// Report on the artifacts currently on disk.
///
/// Missing model artifacts leave the summary out; a missing boundary
/// document is noted in the report.
///
/// # Errors
/// Fails if an artifact exists but cannot be parsed.
pub fn build_report(config: &PipelineConfig, strategy: Option<String>) -> Result<RunReport> {
    let predictions_path = config.predictions_path();
    let metrics_path = config.metrics_path();
    let boundaries_path = config.boundaries_path();

    let mut builder = ReportBuilder::new()
        .artifact("unemployment", &config.unemployment_raw_path())
        .artifact("gdp", &config.gdp_raw_path())
        .artifact("panel", &config.panel_path())
        .artifact("features", &config.features_path())
        .artifact("predictions", &predictions_path)
        .artifact("metrics", &metrics_path)
        .artifact("boundaries", &boundaries_path);
    if let Some(strategy) = strategy {
        builder = builder.strategy(strategy);
    }

    let predictions = if predictions_path.is_file() {
        read_predictions(&predictions_path)?
    } else {
        Vec::new()
    };
    if metrics_path.is_file() {
        let metrics = read_metrics(&metrics_path)?;
        builder = builder.summary(MetricsSummary::new(metrics, &predictions, config.report_top));
    }

    if let Some(index) = BoundaryIndex::load_optional(&boundaries_path)? {
        let index = index.retain_prefix(&config.region.prefix);
        let unmapped = index.missing(predictions.iter().map(|p| p.geo.as_str()));
        builder = builder.boundaries(index.len(), unmapped);
    }

    Ok(builder.build())
}
