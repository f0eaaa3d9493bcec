//! Error types for panel assembly.

use thiserror::Error;

/// Errors that can occur while assembling the region-year panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A decoded table lacks a dimension the panel is keyed on
    #[error("{table} table has no {dimension} dimension")]
    MissingDimension {
        /// Which input table
        table: &'static str,
        /// Missing dimension id
        dimension: String,
    },

    /// No unemployment observation survived filtering and key parsing
    #[error("Panel is empty after filtering")]
    EmptyPanel,
}
