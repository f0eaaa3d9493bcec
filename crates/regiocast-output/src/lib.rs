#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/regiocast/regiocast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod export;
pub mod report;
pub mod summary;

pub use artifacts::{
    BoundaryIndex, read_features, read_metrics, read_panel, read_predictions, read_records,
};
pub use export::{ExportError, ExportFormat, Exporter, MetricsTable};
pub use report::{ArtifactStatus, ReportBuilder, RunReport};
pub use summary::{MetricsSummary, RankedForecast, forecast_ranking};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
