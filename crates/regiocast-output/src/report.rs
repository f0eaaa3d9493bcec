//! Run report over the artifacts found on disk.

use crate::export::ExportError;
use crate::summary::MetricsSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether one expected artifact exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStatus {
    /// Short artifact name, e.g. `predictions`.
    pub name: String,

    /// Location on disk.
    pub path: PathBuf,

    /// Whether the file exists.
    pub present: bool,
}

impl ArtifactStatus {
    /// Check `path` on disk.
    pub fn probe(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            present: path.is_file(),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// How the training rows were split, if known.
    pub strategy: Option<String>,

    /// Expected artifacts and whether they exist.
    pub artifacts: Vec<ArtifactStatus>,

    /// Metrics and forecast ranking.
    pub summary: Option<MetricsSummary>,

    /// Regions in the boundary document, `None` if it is absent.
    pub boundary_regions: Option<usize>,

    /// Predicted regions without a boundary.
    pub unmapped_regions: Vec<String>,
}

impl RunReport {
    /// Convert report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn boundary_line(&self) -> String {
        match self.boundary_regions {
            Some(n) if self.unmapped_regions.is_empty() => {
                format!("Boundary document: {n} regions")
            }
            Some(n) => format!(
                "Boundary document: {n} regions, no boundary for {}",
                self.unmapped_regions.join(", ")
            ),
            None => "Boundary document: not found, map view unavailable".to_string(),
        }
    }

    /// Format for terminal display.
    pub fn to_text(&self) -> String {
        let mut output = format!("Regiocast report ({})\n", self.timestamp.to_rfc3339());
        if let Some(strategy) = &self.strategy {
            output.push_str(&format!("Split: {strategy}\n"));
        }
        output.push_str("\nArtifacts:\n");
        for a in &self.artifacts {
            let mark = if a.present { "ok" } else { "missing" };
            output.push_str(&format!("  {:<10} {:<8} {}\n", a.name, mark, a.path.display()));
        }
        if let Some(summary) = &self.summary {
            output.push_str(&summary.to_ascii_table());
        }
        output.push('\n');
        output.push_str(&self.boundary_line());
        output.push('\n');
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::from("# Regiocast Report\n\n");
        output.push_str(&format!("**Generated:** {}\n\n", self.timestamp.to_rfc3339()));
        if let Some(strategy) = &self.strategy {
            output.push_str(&format!("**Split:** {strategy}\n\n"));
        }
        output.push_str("## Artifacts\n\n");
        for a in &self.artifacts {
            let mark = if a.present { "x" } else { " " };
            output.push_str(&format!("- [{mark}] `{}` ({})\n", a.path.display(), a.name));
        }
        output.push('\n');
        if let Some(summary) = &self.summary {
            output.push_str(&summary.to_markdown());
        }
        output.push_str(&self.boundary_line());
        output.push('\n');
        output
    }
}

/// Builder for run reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    strategy: Option<String>,
    artifacts: Vec<ArtifactStatus>,
    summary: Option<MetricsSummary>,
    boundary_regions: Option<usize>,
    unmapped_regions: Vec<String>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the split description.
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Record an expected artifact.
    pub fn artifact(mut self, name: &str, path: &Path) -> Self {
        self.artifacts.push(ArtifactStatus::probe(name, path));
        self
    }

    /// Set the metrics summary.
    pub fn summary(mut self, summary: MetricsSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Record boundary coverage.
    pub fn boundaries(mut self, regions: usize, unmapped: Vec<String>) -> Self {
        self.boundary_regions = Some(regions);
        self.unmapped_regions = unmapped;
        self
    }

    /// Build the report.
    pub fn build(self) -> RunReport {
        RunReport {
            timestamp: Utc::now(),
            strategy: self.strategy,
            artifacts: self.artifacts,
            summary: self.summary,
            boundary_regions: self.boundary_regions,
            unmapped_regions: self.unmapped_regions,
        }
    }
}
