//! Serde model of a JSON-stat 2.0 dataset response.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A JSON-stat dataset as returned by the Eurostat dissemination API.
///
/// Structural fields default to empty so that a document with missing
/// metadata still deserializes and is rejected by [`Cube`](super::Cube)
/// validation with a descriptive error instead of a serde message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonStatDocument {
    /// Dataset title
    #[serde(default)]
    pub label: Option<String>,
    /// Last update timestamp as reported by the source
    #[serde(default)]
    pub updated: Option<String>,
    /// Ordered dimension identifiers
    #[serde(default)]
    pub id: Vec<String>,
    /// Dimension cardinalities, parallel to `id`
    #[serde(default)]
    pub size: Vec<usize>,
    /// Per-dimension metadata keyed by dimension id
    #[serde(default)]
    pub dimension: HashMap<String, JsonStatDimension>,
    /// Observation values addressed by flat index
    #[serde(default)]
    pub value: ValueStore,
}

/// Metadata for one dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonStatDimension {
    /// Human-readable dimension name
    #[serde(default)]
    pub label: Option<String>,
    /// Category codes, positions and labels
    #[serde(default)]
    pub category: Option<JsonStatCategory>,
}

/// Category block of a dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonStatCategory {
    /// Code to position mapping (object form) or ordered codes (array form)
    #[serde(default)]
    pub index: Option<CategoryIndex>,
    /// Code to human-readable label
    #[serde(default)]
    pub label: HashMap<String, String>,
}

/// The two encodings JSON-stat allows for `category.index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    /// `["ITC1", "ITC2"]`
    Ordered(Vec<String>),
    /// `{"ITC1": 0, "ITC2": 1}`
    Positions(HashMap<String, usize>),
}

impl JsonStatCategory {
    /// Resolve the category codes ordered by flat-array position.
    ///
    /// The number of codes must equal the declared dimension size. A
    /// single-category dimension may omit `index` and carry only a label.
    pub fn ordered_codes(&self, dimension: &str, size: usize) -> Result<Vec<String>> {
        let codes = match &self.index {
            Some(CategoryIndex::Ordered(codes)) => codes.clone(),
            Some(CategoryIndex::Positions(positions)) => {
                let mut slots: Vec<Option<String>> = vec![None; size];
                for (code, &pos) in positions {
                    let slot = slots.get_mut(pos).ok_or_else(|| {
                        DataError::structure(format!(
                            "dimension {dimension}: category {code} at position {pos} exceeds size {size}"
                        ))
                    })?;
                    if let Some(existing) = slot.replace(code.clone()) {
                        return Err(DataError::structure(format!(
                            "dimension {dimension}: categories {existing} and {code} share position {pos}"
                        )));
                    }
                }
                slots.into_iter().flatten().collect()
            }
            None if self.label.len() == 1 => self.label.keys().cloned().collect(),
            None => {
                return Err(DataError::structure(format!(
                    "dimension {dimension} has no category index"
                )));
            }
        };

        if codes.len() != size {
            return Err(DataError::structure(format!(
                "dimension {dimension} declares size {size} but lists {} categories",
                codes.len()
            )));
        }
        Ok(codes)
    }
}

/// Storage of observation values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueStore {
    /// Ordered array, one slot per flat index, `null` for no observation
    Dense(Vec<Option<f64>>),
    /// Mapping from stringified flat index to value
    Sparse(HashMap<String, Option<f64>>),
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::Sparse(HashMap::new())
    }
}

impl ValueStore {
    /// Normalize either storage to a flat-index map, dropping nulls.
    pub fn normalize(&self) -> Result<BTreeMap<usize, f64>> {
        match self {
            Self::Dense(values) => Ok(values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i, v)))
                .collect()),
            Self::Sparse(values) => {
                let mut out = BTreeMap::new();
                for (key, value) in values {
                    let index: usize = key.trim().parse().map_err(|_| {
                        DataError::structure(format!("value key {key:?} is not a flat index"))
                    })?;
                    if let Some(v) = value {
                        out.insert(index, *v);
                    }
                }
                Ok(out)
            }
        }
    }
}
