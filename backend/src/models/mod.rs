//! Domain models for the dashboard data pipeline.
//!
//! - [`Cell`] - A single value: text, number, or missing
//! - [`Table`] - Header plus ordered rows of cells
//! - [`DevelopmentStatus`] - Closed two-way country classification

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// One value of a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Empty field, NA marker, or a value that failed numeric coercion.
    #[default]
    Missing,
    /// Raw text as read from the file.
    Text(String),
    /// Parsed number. Always finite.
    Number(f64),
}

impl Cell {
    /// Build a numeric cell, mapping NaN and infinities to [`Cell::Missing`].
    pub fn number(value: f64) -> Self {
        if !value.is_finite() {
            Cell::Missing
        } else {
            Cell::Number(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric value, only for cells already coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Lenient numeric conversion: anything that does not parse becomes missing.
    pub fn coerce_numeric(&self) -> Cell {
        match self {
            Cell::Number(n) => Cell::number(*n),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Cell::number)
                .unwrap_or(Cell::Missing),
            Cell::Missing => Cell::Missing,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Missing => Value::Null,
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// A row of cells aligned with its table's header.
pub type Row = Vec<Cell>;

/// Ordered rows sharing one header.
///
/// Row order is source order. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding short rows with missing cells and truncating long ones.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self::new(headers);
        for row in rows {
            table.push(row);
        }
        table
    }

    pub fn push(&mut self, mut row: Row) {
        row.resize(self.headers.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact (case-sensitive) column position.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Same header, no rows.
    pub fn empty_like(&self) -> Self {
        Self::new(self.headers.clone())
    }

    /// Keep the rows for which `keep` returns true, in order.
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rows at the given positions, in the order given.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Append a column. `values` must have one cell per row.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Cell>) -> Self {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
        self
    }

    /// Stable sort with an arbitrary row comparator.
    pub fn sorted_by<F>(mut self, compare: F) -> Self
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        self.rows.sort_by(compare);
        self
    }

    /// Stable sort by a numeric column, missing values last.
    pub fn sorted_by_number(self, col: usize) -> Self {
        self.sorted_by(|a, b| compare_numbers(&a[col], &b[col]))
    }

    /// Sorted distinct non-missing values of a column, rendered as text.
    pub fn unique_values(&self, col: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !r[col].is_missing())
            .map(|r| r[col].to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Min and max of a numeric column.
    pub fn numeric_range(&self, col: usize) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r[col].as_f64())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// One row as a JSON object keyed by header.
    pub fn row_to_json(&self, index: usize) -> Option<Value> {
        let row = self.rows.get(index)?;
        let obj: Map<String, Value> = self
            .headers
            .iter()
            .zip(row)
            .map(|(h, c)| (h.clone(), c.to_json()))
            .collect();
        Some(Value::Object(obj))
    }

    /// All rows as JSON objects.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.rows.len())
            .filter_map(|i| self.row_to_json(i))
            .collect()
    }
}

/// Numeric ordering of two cells, missing (or non-numeric) values last.
pub fn compare_numbers(a: &Cell, b: &Cell) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

struct RowRef<'a> {
    headers: &'a [String],
    row: &'a Row,
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (header, cell) in self.headers.iter().zip(self.row) {
            map.serialize_entry(header, cell)?;
        }
        map.end()
    }
}

/// Serialized as an array of objects; keys follow header order.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef {
                headers: &self.headers,
                row,
            })?;
        }
        seq.end()
    }
}

// =============================================================================
// Development Status
// =============================================================================

/// Country classification used by the matched comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevelopmentStatus {
    Developed,
    Developing,
}

impl DevelopmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentStatus::Developed => "Developed",
            DevelopmentStatus::Developing => "Developing",
        }
    }
}

impl fmt::Display for DevelopmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["country".into(), "year".into()],
            vec![
                vec![Cell::text("Peru"), Cell::Number(2020.0)],
                vec![Cell::text("Chad"), Cell::Number(2018.0)],
                vec![Cell::text("Peru")],
            ],
        )
    }

    #[test]
    fn test_short_rows_padded() {
        let table = sample();
        assert_eq!(table.rows()[2].len(), 2);
        assert!(table.rows()[2][1].is_missing());
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(Cell::text(" 42.5 ").coerce_numeric(), Cell::Number(42.5));
        assert_eq!(Cell::text("N/A").coerce_numeric(), Cell::Missing);
        assert_eq!(Cell::text("NaN").coerce_numeric(), Cell::Missing);
        assert_eq!(Cell::text("inf").coerce_numeric(), Cell::Missing);
        assert_eq!(Cell::text("-Infinity").coerce_numeric(), Cell::Missing);
        assert_eq!(Cell::number(f64::INFINITY), Cell::Missing);
        assert_eq!(Cell::Number(7.0).coerce_numeric(), Cell::Number(7.0));
    }

    #[test]
    fn test_unique_values_sorted() {
        assert_eq!(sample().unique_values(0), vec!["Chad", "Peru"]);
    }

    #[test]
    fn test_numeric_range_skips_missing() {
        assert_eq!(sample().numeric_range(1), Some((2018.0, 2020.0)));
        assert_eq!(Table::new(vec!["x".into()]).numeric_range(0), None);
    }

    #[test]
    fn test_sorted_by_number_missing_last() {
        let sorted = sample().sorted_by_number(1);
        assert_eq!(sorted.rows()[0][0], Cell::text("Chad"));
        assert!(sorted.rows()[2][1].is_missing());
    }

    #[test]
    fn test_serialize_as_records() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json[0]["country"], "Peru");
        assert_eq!(json[0]["year"], 2020.0);
        assert!(json[2]["year"].is_null());
    }

    #[test]
    fn test_with_column() {
        let table = sample().with_column("flag", vec![Cell::Number(1.0); 3]);
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.rows()[1][2], Cell::Number(1.0));
    }
}
