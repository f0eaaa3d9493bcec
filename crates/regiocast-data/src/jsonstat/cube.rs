//! Typed cube metadata and flat-index decoding.

use super::document::JsonStatDocument;
use super::tidy::{Observation, TidyTable};
use crate::error::{DataError, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One dimension of a cube: its identifier, ordered category codes and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Dimension identifier (e.g. `geo`, `time`)
    pub id: String,
    /// Human-readable dimension name, if provided
    pub label: Option<String>,
    codes: Vec<String>,
    labels: HashMap<String, String>,
}

impl Dimension {
    /// Create a dimension from codes ordered by flat-array position.
    pub fn new(
        id: impl Into<String>,
        codes: Vec<String>,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: None,
            codes,
            labels,
        }
    }

    /// Number of categories.
    pub fn size(&self) -> usize {
        self.codes.len()
    }

    /// Category codes in position order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Category code at `position`.
    pub fn code(&self, position: usize) -> Option<&str> {
        self.codes.get(position).map(String::as_str)
    }

    /// Label for `code`, falling back to the code itself.
    pub fn label_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.labels.get(code).map_or(code, String::as_str)
    }
}

/// A validated statistical cube.
///
/// Holds dimension metadata and the present (non-null) values keyed by flat
/// index. The address space is the product of all dimension sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    dimensions: Vec<Dimension>,
    values: BTreeMap<usize, f64>,
    address_space: usize,
}

impl Cube {
    /// Build a cube from dimensions and a sparse value map.
    ///
    /// # Errors
    /// Returns [`DataError::Structure`] if there are no dimensions, the
    /// address space overflows, or values exist while some dimension is empty.
    pub fn new(dimensions: Vec<Dimension>, values: BTreeMap<usize, f64>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(DataError::structure("cube declares no dimensions"));
        }

        let address_space = dimensions.iter().try_fold(1usize, |acc, d| {
            acc.checked_mul(d.size()).ok_or_else(|| {
                DataError::structure(format!("address space overflows at dimension {}", d.id))
            })
        })?;

        if !values.is_empty()
            && let Some(empty) = dimensions.iter().find(|d| d.size() == 0)
        {
            return Err(DataError::structure(format!(
                "dimension {} has no categories but the cube holds {} values",
                empty.id,
                values.len()
            )));
        }

        Ok(Self {
            dimensions,
            values,
            address_space,
        })
    }

    /// Build a cube from a dense value array where `None` marks no observation.
    pub fn from_dense(dimensions: Vec<Dimension>, values: &[Option<f64>]) -> Result<Self> {
        let values = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
            .collect();
        Self::new(dimensions, values)
    }

    /// Dimensions in declaration order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Present values keyed by flat index.
    pub const fn values(&self) -> &BTreeMap<usize, f64> {
        &self.values
    }

    /// Dimension sizes in declaration order.
    pub fn sizes(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::size).collect()
    }

    /// Product of all dimension sizes.
    pub const fn address_space(&self) -> usize {
        self.address_space
    }

    /// Number of present values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the cube holds no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decode every present value into a tidy observation.
    ///
    /// Rows come out in ascending flat-index order, but callers should not
    /// rely on it. Indices beyond the address space are clamped per
    /// dimension rather than rejected.
    pub fn decode(&self) -> Result<TidyTable> {
        let sizes = self.sizes();
        let mults = multipliers(&sizes);
        let ids = self.dimensions.iter().map(|d| d.id.clone()).collect();
        let mut table = TidyTable::new(ids);

        let clamped = self.values.range(self.address_space..).count();
        if clamped > 0 {
            debug!(
                clamped,
                address_space = self.address_space,
                "flat indices outside address space"
            );
        }

        for (&flat, &value) in &self.values {
            let coords = unravel_index(flat, &sizes, &mults);
            let mut codes = Vec::with_capacity(coords.len());
            let mut labels = Vec::with_capacity(coords.len());
            for (dim, &pos) in self.dimensions.iter().zip(&coords) {
                let code = dim.code(pos).ok_or_else(|| {
                    DataError::structure(format!(
                        "dimension {} has no category at position {pos}",
                        dim.id
                    ))
                })?;
                codes.push(code.to_string());
                labels.push(dim.label_for(code).to_string());
            }
            table.push(Observation {
                codes,
                labels,
                value,
            })?;
        }

        Ok(table)
    }
}

impl TryFrom<JsonStatDocument> for Cube {
    type Error = DataError;

    fn try_from(doc: JsonStatDocument) -> Result<Self> {
        if doc.id.len() != doc.size.len() {
            return Err(DataError::structure(format!(
                "{} dimension ids but {} sizes",
                doc.id.len(),
                doc.size.len()
            )));
        }

        let mut dimension_meta = doc.dimension;
        let mut dimensions = Vec::with_capacity(doc.id.len());
        for (id, &size) in doc.id.iter().zip(&doc.size) {
            let meta = dimension_meta
                .remove(id)
                .ok_or_else(|| DataError::structure(format!("no metadata for dimension {id}")))?;
            let category = meta
                .category
                .ok_or_else(|| DataError::structure(format!("dimension {id} has no category")))?;
            let codes = category.ordered_codes(id, size)?;
            let mut dimension = Dimension::new(id.clone(), codes, category.label);
            dimension.label = meta.label;
            dimensions.push(dimension);
        }

        let values = doc.value.normalize()?;
        Self::new(dimensions, values)
    }
}

/// Positional multipliers: for each dimension, the product of the sizes of
/// all dimensions after it.
pub fn multipliers(sizes: &[usize]) -> Vec<usize> {
    let mut out = vec![1usize; sizes.len()];
    let mut acc = 1usize;
    for (slot, &size) in out.iter_mut().zip(sizes).rev() {
        *slot = acc;
        acc = acc.saturating_mul(size);
    }
    out
}

/// Decompose a flat index into per-dimension coordinates.
///
/// Each coordinate is clamped to `size - 1` (or 0 for an empty dimension).
pub fn unravel_index(flat: usize, sizes: &[usize], multipliers: &[usize]) -> Vec<usize> {
    let mut remaining = flat;
    sizes
        .iter()
        .zip(multipliers)
        .map(|(&size, &mult)| {
            let coord = remaining.checked_div(mult).unwrap_or(0);
            remaining = remaining.checked_rem(mult).unwrap_or(0);
            coord.min(size.saturating_sub(1))
        })
        .collect()
}

/// Re-encode coordinates into a flat index.
pub fn ravel_index(coords: &[usize], multipliers: &[usize]) -> usize {
    coords.iter().zip(multipliers).map(|(c, m)| c * m).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    fn dim(id: &str, codes: &[&str]) -> Dimension {
        Dimension::new(
            id,
            codes.iter().map(|c| c.to_string()).collect(),
            HashMap::new(),
        )
    }

    #[rstest]
    #[case(&[2, 3, 4], &[12, 4, 1])]
    #[case(&[5], &[1])]
    #[case(&[1, 1, 7], &[7, 7, 1])]
    fn test_multipliers(#[case] sizes: &[usize], #[case] expected: &[usize]) {
        assert_eq!(multipliers(sizes), expected);
    }

    #[test]
    fn test_unravel_every_index_is_unique_and_reversible() {
        let sizes = [2, 3, 4];
        let mults = multipliers(&sizes);
        let mut seen = HashSet::new();
        for flat in 0..24 {
            let coords = unravel_index(flat, &sizes, &mults);
            assert_eq!(ravel_index(&coords, &mults), flat);
            assert!(seen.insert(coords));
        }
    }

    #[test]
    fn test_unravel_clamps_out_of_range() {
        let sizes = [2, 3];
        let mults = multipliers(&sizes);
        // flat 9 -> first coordinate 3, clamped to 1
        assert_eq!(unravel_index(9, &sizes, &mults), vec![1, 0]);
        assert_eq!(unravel_index(usize::MAX, &sizes, &mults)[0], 1);
    }

    #[test]
    fn test_unravel_empty_dimension_never_negative() {
        let sizes = [0, 3];
        let mults = multipliers(&sizes);
        assert_eq!(unravel_index(5, &sizes, &mults), vec![0, 2]);
    }

    #[test]
    fn test_dense_decode_yields_full_grid() {
        let dims = vec![dim("a", &["a0", "a1"]), dim("b", &["b0", "b1", "b2"])];
        let values: Vec<Option<f64>> = (0..6).map(|v| Some(v as f64)).collect();
        let table = Cube::from_dense(dims, &values).unwrap().decode().unwrap();
        assert_eq!(table.len(), 6);
        let last = &table.rows()[5];
        assert_eq!(last.codes, vec!["a1", "b2"]);
        assert_eq!(last.value, 5.0);
    }

    #[test]
    fn test_label_falls_back_to_code() {
        let mut labels = HashMap::new();
        labels.insert("ITC1".to_string(), "Piemonte".to_string());
        let dims = vec![Dimension::new(
            "geo",
            vec!["ITC1".into(), "ITC2".into()],
            labels,
        )];
        let table = Cube::from_dense(dims, &[Some(1.0), Some(2.0)])
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(table.rows()[0].labels, vec!["Piemonte"]);
        assert_eq!(table.rows()[1].labels, vec!["ITC2"]);
    }

    #[test]
    fn test_out_of_space_index_is_clamped_not_rejected() {
        let dims = vec![dim("a", &["x", "y"]), dim("b", &["p", "q"])];
        let mut values = BTreeMap::new();
        values.insert(10, 4.2);
        let table = Cube::new(dims, values).unwrap().decode().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].codes, vec!["y", "p"]);
    }

    #[test]
    fn test_no_dimensions_is_structural() {
        assert!(matches!(
            Cube::new(vec![], BTreeMap::new()),
            Err(DataError::Structure(_))
        ));
    }

    #[test]
    fn test_empty_dimension_with_values_is_structural() {
        let mut values = BTreeMap::new();
        values.insert(0, 1.0);
        let result = Cube::new(vec![dim("a", &[])], values);
        assert!(matches!(result, Err(DataError::Structure(_))));
    }

    #[test]
    fn test_missing_dimension_metadata_is_structural() {
        let doc: JsonStatDocument = serde_json::from_str(
            r#"{"id": ["geo", "time"], "size": [1, 1],
                "dimension": {"geo": {"category": {"index": {"IT": 0}}}},
                "value": {"0": 1.0}}"#,
        )
        .unwrap();
        assert!(matches!(Cube::try_from(doc), Err(DataError::Structure(_))));
    }

    #[test]
    fn test_id_size_mismatch_is_structural() {
        let doc: JsonStatDocument =
            serde_json::from_str(r#"{"id": ["geo"], "size": [1, 2], "dimension": {}}"#).unwrap();
        assert!(matches!(Cube::try_from(doc), Err(DataError::Structure(_))));
    }
}
