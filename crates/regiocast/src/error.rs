//! Errors of a pipeline run.

use regiocast_data::DataError;
use regiocast_model::ModelError;
use regiocast_output::ExportError;
use regiocast_panel::PanelError;
use thiserror::Error;

/// Result type for pipeline stages.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Any failure that stops a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching, decoding or caching failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Panel assembly failed
    #[error(transparent)]
    Panel(#[from] PanelError),

    /// Training or evaluation failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Writing or reading an artifact failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
