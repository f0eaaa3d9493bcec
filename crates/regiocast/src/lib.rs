#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/regiocast/regiocast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export member crates
pub use regiocast_data as data;
pub use regiocast_model as model;
pub use regiocast_output as output;
pub use regiocast_panel as panel;

pub use config::{ArtifactPaths, DatasetSpec, PipelineConfig};
pub use error::{PipelineError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
