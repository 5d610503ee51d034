//! Core table types for representing delimited tabular data

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// A parsed table, either loaded from one file or built by concatenation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Source file path (or the output path for compiled tables)
    pub source_path: PathBuf,
}

impl Table {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All values of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let col = self.find_column(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(col.index).unwrap_or(&CellValue::Empty))
                .collect(),
        )
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data, one cell per table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type.
    ///
    /// The text is kept verbatim: a typed value is only produced when it
    /// prints back to exactly `s`, so `"007"` and `" 5"` stay strings.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(i) = s.parse::<i64>() {
            if i.to_string() == s {
                return CellValue::Integer(i);
            }
            return CellValue::String(s.to_string());
        }

        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() && f.to_string() == s {
                return CellValue::Float(f);
            }
        }

        CellValue::String(s.to_string())
    }

    /// Numeric interpretation used for sorting.
    ///
    /// Strings are coerced when they parse as a number ("1e3", "007",
    /// "2.50"); everything else, including NaN and empty cells, is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) if f.is_finite() => Some(*f),
            CellValue::Float(_) => None,
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            CellValue::Empty => None,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, ""),
        }
    }
}

/// Total order over optional numeric sort keys.
///
/// Numbers compare numerically; `None` (unsortable) sorts after every number
/// and two `None`s are equal, so a stable sort keeps their original order.
pub fn compare_sort_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        // Keys never hold NaN, so partial_cmp is total here and -0.0 == 0.0
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
