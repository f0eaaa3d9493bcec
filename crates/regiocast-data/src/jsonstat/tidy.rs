//! Tidy observation tables.
//!
//! A [`TidyTable`] holds one row per observed value with a code and a label
//! for every dimension. On disk the layout is one `<dim>` and one
//! `<dim>_name` column per dimension followed by a `value` column.

use crate::error::{DataError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Suffix of the label column written next to each dimension code column.
pub const LABEL_SUFFIX: &str = "_name";

/// Name of the value column.
pub const VALUE_COLUMN: &str = "value";

/// A single observed value with its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Category code per dimension, in table dimension order
    pub codes: Vec<String>,
    /// Human-readable label per dimension, in table dimension order
    pub labels: Vec<String>,
    /// Observed value
    pub value: f64,
}

impl Observation {
    /// Code at dimension position `index`.
    pub fn code(&self, index: usize) -> Option<&str> {
        self.codes.get(index).map(String::as_str)
    }

    /// Label at dimension position `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

/// One row per observation, one code/label pair per dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidyTable {
    dimensions: Vec<String>,
    rows: Vec<Observation>,
}

impl TidyTable {
    /// Create an empty table over the given dimensions.
    pub const fn new(dimensions: Vec<String>) -> Self {
        Self {
            dimensions,
            rows: Vec::new(),
        }
    }

    /// Create a table from existing rows.
    ///
    /// # Errors
    /// Returns [`DataError::Structure`] if any row does not carry exactly one
    /// code and one label per dimension.
    pub fn from_rows(dimensions: Vec<String>, rows: Vec<Observation>) -> Result<Self> {
        let mut table = Self::new(dimensions);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Append a row.
    pub fn push(&mut self, row: Observation) -> Result<()> {
        let n = self.dimensions.len();
        if row.codes.len() != n || row.labels.len() != n {
            return Err(DataError::structure(format!(
                "row has {} codes and {} labels for {n} dimensions",
                row.codes.len(),
                row.labels.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Dimension identifiers in column order.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// All rows.
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Consume the table and return its rows.
    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `dimension` among the table's dimensions.
    pub fn dimension_index(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dimension)
    }

    /// Whether the table carries `dimension`.
    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.dimension_index(dimension).is_some()
    }

    /// Distinct codes of `dimension` in order of first appearance.
    pub fn distinct_codes(&self, dimension: &str) -> Vec<&str> {
        let Some(idx) = self.dimension_index(dimension) else {
            return Vec::new();
        };
        let mut seen = Vec::new();
        for code in self.rows.iter().filter_map(|r| r.code(idx)) {
            if !seen.contains(&code) {
                seen.push(code);
            }
        }
        seen
    }

    /// Keep only rows satisfying `keep`.
    #[must_use]
    pub fn filter<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&Observation) -> bool,
    {
        self.rows.retain(keep);
        self
    }

    /// Keep only rows whose `dimension` code equals `code`.
    ///
    /// A table without `dimension` is returned unchanged.
    #[must_use]
    pub fn filter_code(self, dimension: &str, code: &str) -> Self {
        match self.dimension_index(dimension) {
            Some(idx) => self.filter(|row| row.code(idx) == Some(code)),
            None => self,
        }
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.dimensions.len() * 2 + 1);
        for dim in &self.dimensions {
            header.push(dim.clone());
            header.push(format!("{dim}{LABEL_SUFFIX}"));
        }
        header.push(VALUE_COLUMN.to_string());
        wtr.write_record(&header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(header.len());
            for (code, label) in row.codes.iter().zip(&row.labels) {
                record.push(code.clone());
                record.push(label.clone());
            }
            record.push(row.value.to_string());
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`TidyTable::write_csv`].
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let columns: Vec<&str> = headers.iter().collect();
        let Some((&last, dims)) = columns.split_last() else {
            return Err(DataError::Parse("empty header".to_string()));
        };
        if last != VALUE_COLUMN || dims.len() % 2 != 0 {
            return Err(DataError::Parse(format!(
                "expected <dim>,<dim>{LABEL_SUFFIX} pairs followed by {VALUE_COLUMN}, got {columns:?}"
            )));
        }

        let mut dimensions = Vec::with_capacity(dims.len() / 2);
        for pair in dims.chunks(2) {
            if pair[1] != format!("{}{LABEL_SUFFIX}", pair[0]) {
                return Err(DataError::Parse(format!(
                    "column {} is not the label column of {}",
                    pair[1], pair[0]
                )));
            }
            dimensions.push(pair[0].to_string());
        }

        let mut table = Self::new(dimensions);
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let mut codes = Vec::with_capacity(table.dimensions.len());
            let mut labels = Vec::with_capacity(table.dimensions.len());
            for i in 0..table.dimensions.len() {
                codes.push(record.get(2 * i).unwrap_or_default().to_string());
                labels.push(record.get(2 * i + 1).unwrap_or_default().to_string());
            }
            let raw = record.get(2 * table.dimensions.len()).unwrap_or_default();
            let value = raw.trim().parse::<f64>().map_err(|_| {
                DataError::Parse(format!("row {}: invalid value {raw:?}", line + 1))
            })?;
            table.push(Observation {
                codes,
                labels,
                value,
            })?;
        }

        Ok(table)
    }

    /// Write the table to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    /// Read a table from a CSV file.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_csv(File::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(geo: &str, time: &str, value: f64) -> Observation {
        Observation {
            codes: vec![geo.to_string(), time.to_string()],
            labels: vec![format!("{geo}, region"), time.to_string()],
            value,
        }
    }

    fn sample() -> TidyTable {
        TidyTable::from_rows(
            vec!["geo".to_string(), "time".to_string()],
            vec![
                obs("ITC1", "2021", 7.5),
                obs("ITC2", "2021", 5.0),
                obs("ITC1", "2022", 6.9),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_push_rejects_wrong_arity() {
        let mut table = TidyTable::new(vec!["geo".to_string()]);
        let result = table.push(obs("ITC1", "2021", 1.0));
        assert!(matches!(result, Err(DataError::Structure(_))));
    }

    #[test]
    fn test_distinct_codes_first_appearance() {
        let table = sample();
        assert_eq!(table.distinct_codes("geo"), vec!["ITC1", "ITC2"]);
        assert_eq!(table.distinct_codes("time"), vec!["2021", "2022"]);
        assert!(table.distinct_codes("unit").is_empty());
    }

    #[test]
    fn test_filter_code() {
        let table = sample().filter_code("geo", "ITC1");
        assert_eq!(table.len(), 2);
        let untouched = sample().filter_code("unit", "PC");
        assert_eq!(untouched.len(), 3);
    }

    #[test]
    fn test_csv_round_trip_preserves_labels_with_commas() {
        let table = sample();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("geo,geo_name,time,time_name,value"));

        let back = TidyTable::read_csv(buf.as_slice()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_read_csv_rejects_bad_header() {
        let data = "geo,time,value\nITC1,2021,1.0\n";
        assert!(matches!(
            TidyTable::read_csv(data.as_bytes()),
            Err(DataError::Parse(_))
        ));
    }
}
