#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/regiocast/regiocast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod error;
pub mod features;
pub mod filter;
pub mod registry;

pub use assemble::{PanelAssembler, PanelRow};
pub use error::PanelError;
pub use features::{FeatureRow, derive_features, yoy_growth_pct};
pub use filter::{DimensionPreference, RegionPattern, pick_preferred, select_preferred};

pub use registry::{FEATURE_COLUMNS, NUMERIC_PREDICTORS};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
