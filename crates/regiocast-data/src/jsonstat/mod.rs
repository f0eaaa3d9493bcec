//! JSON-stat 2.0 decoding.
//!
//! A JSON-stat dataset stores a multi-dimensional cube as a single flat value
//! array plus per-dimension category metadata. This module provides:
//! - [`JsonStatDocument`]: the wire format, deserialized with serde
//! - [`Cube`]: validated, typed dimension metadata and present values
//! - [`TidyTable`]: one [`Observation`] per present value
//!
//! # Example
//!
//! ```
//! use regiocast_data::jsonstat::{Cube, JsonStatDocument};
//!
//! let doc: JsonStatDocument = serde_json::from_str(r#"{
//!     "id": ["geo", "time"],
//!     "size": [2, 2],
//!     "dimension": {
//!         "geo": {"category": {"index": {"ITC1": 0, "ITC2": 1},
//!                              "label": {"ITC1": "Piemonte"}}},
//!         "time": {"category": {"index": {"2021": 0, "2022": 1}}}
//!     },
//!     "value": {"0": 7.1, "3": 6.4}
//! }"#).unwrap();
//!
//! let table = Cube::try_from(doc).unwrap().decode().unwrap();
//! assert_eq!(table.len(), 2);
//! ```

pub mod cube;
pub mod document;
pub mod tidy;

pub use cube::{Cube, Dimension, multipliers, ravel_index, unravel_index};
pub use document::{CategoryIndex, JsonStatCategory, JsonStatDimension, JsonStatDocument, ValueStore};
pub use tidy::{Observation, TidyTable};
