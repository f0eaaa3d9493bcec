//! Model comparison and next-year forecast ranking.
//!
//! Mirrors what the dashboard shows: one metrics row per model, the model
//! with the lowest RMSE, and regions ranked by that model's predicted
//! unemployment for the most recent feature year.

use crate::export::MetricsTable;
use regiocast_model::PredictionRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predictions of `model` for its latest year, highest forecast first.
///
/// Ties keep region code order.
pub fn forecast_ranking<'a>(predictions: &'a [PredictionRow], model: &str) -> Vec<&'a PredictionRow> {
    let of_model = || predictions.iter().filter(move |p| p.model == model);
    let Some(latest) = of_model().map(|p| p.year).max() else {
        return Vec::new();
    };
    let mut ranked: Vec<&PredictionRow> = of_model().filter(|p| p.year == latest).collect();
    ranked.sort_by(|a, b| {
        b.y_pred_next_year
            .total_cmp(&a.y_pred_next_year)
            .then_with(|| a.geo.cmp(&b.geo))
    });
    ranked
}

/// One entry of the forecast ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedForecast {
    /// NUTS2 region code
    pub geo: String,
    /// Region display name
    pub region: String,
    /// Feature year the forecast starts from
    pub year: i32,
    /// Predicted unemployment rate for the following year
    pub y_pred_next_year: f64,
}

/// Metrics of all models plus the best model's forecast ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Metrics keyed by model name.
    pub metrics: MetricsTable,

    /// Model with the lowest RMSE.
    pub best_model: Option<String>,

    /// Best model's forecasts, highest first.
    pub ranking: Vec<RankedForecast>,
}

impl MetricsSummary {
    /// Summarize metrics and keep the `top` highest forecasts of the best
    /// model.
    pub fn new(metrics: MetricsTable, predictions: &[PredictionRow], top: usize) -> Self {
        let best_model = metrics.best_by_rmse().map(|(name, _)| name.to_string());
        let ranking = best_model
            .as_deref()
            .map(|model| {
                forecast_ranking(predictions, model)
                    .into_iter()
                    .take(top)
                    .map(|p| RankedForecast {
                        geo: p.geo.clone(),
                        region: p.region.clone(),
                        year: p.year,
                        y_pred_next_year: p.y_pred_next_year,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            metrics,
            best_model,
            ranking,
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nModel Evaluation\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Model", "MAE", "RMSE", "R2", "Train", "Test"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');
        for (model, m) in &self.metrics.0 {
            output.push_str(&format!(
                "{:<20} {:>12.4} {:>12.4} {:>12.4} {:>10} {:>10}\n",
                model, m.mae, m.rmse, m.r2, m.n_train, m.n_test
            ));
        }

        if let Some(best) = &self.best_model {
            output.push_str(&format!("\nBest model (lowest RMSE): {best}\n"));
        }

        if let Some(first) = self.ranking.first() {
            output.push_str(&format!(
                "\nForecast for {} (from {} data):\n",
                first.year + 1,
                first.year
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!("{:<8} {:<40} {:>14}\n", "Geo", "Region", "Forecast %"));
            for f in &self.ranking {
                output.push_str(&format!(
                    "{:<8} {:<40} {:>14.2}\n",
                    f.geo, f.region, f.y_pred_next_year
                ));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("## Model Evaluation\n\n");
        output.push_str("| Model | MAE | RMSE | R2 | Train | Test |\n");
        output.push_str("|-------|-----|------|----|-------|------|\n");
        for (model, m) in &self.metrics.0 {
            output.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {} | {} |\n",
                model, m.mae, m.rmse, m.r2, m.n_train, m.n_test
            ));
        }
        output.push('\n');

        if let Some(best) = &self.best_model {
            output.push_str(&format!("**Best model (lowest RMSE):** {best}\n\n"));
        }

        if let Some(first) = self.ranking.first() {
            output.push_str(&format!("## Forecast for {}\n\n", first.year + 1));
            output.push_str("| Geo | Region | Forecast % |\n");
            output.push_str("|-----|--------|------------|\n");
            for f in &self.ranking {
                output.push_str(&format!(
                    "| {} | {} | {:.2} |\n",
                    f.geo, f.region, f.y_pred_next_year
                ));
            }
            output.push('\n');
        }

        output
    }
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.metrics)?;
        if let Some(best) = &self.best_model {
            writeln!(f, "Best model: {best}")?;
        }
        Ok(())
    }
}
