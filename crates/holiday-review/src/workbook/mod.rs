//! Schema-less view of workbook sheets.
//!
//! Every sheet is exposed as an ordered list of column names (taken from the
//! header row) plus one record per non-blank data row. Records map column
//! names to cell values; missing cells are present as [`CellValue::Empty`].

mod reader;

pub use reader::WorkbookReader;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Numeric reading of the cell. Text is trimmed before parsing; blank and
    /// non-numeric text yield `None`, as do non-finite values.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Empty => return None,
            Self::Number(value) => *value,
            Self::Bool(flag) => f64::from(u8::from(*flag)),
            Self::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
        };

        value.is_finite().then_some(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub type Record = HashMap<String, CellValue>;

/// One decoded sheet: header-derived columns in sheet order plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Builds a table from string literals; handy for fixtures and callers
    /// that already hold tabular text.
    pub fn from_rows<const N: usize>(
        name: impl Into<String>,
        columns: [&str; N],
        rows: Vec<[CellValue; N]>,
    ) -> Self {
        let columns: Vec<String> = columns.iter().map(|column| column.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|cells| columns.iter().cloned().zip(cells).collect())
            .collect();
        Self::new(name, columns, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Failure to turn bytes into sheet records.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("result is not a readable workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("sheet '{0}' not found")]
    MissingSheet(String),
    #[error("sheet '{sheet}' could not be decoded: {message}")]
    Sheet { sheet: String, message: String },
}

/// Turns header cells into unique column names. Blank headers become
/// `__EMPTY`, `__EMPTY_1`, ...; repeated names gain `_1`, `_2`, ... suffixes.
pub(crate) fn header_names<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for cell in cells {
        let base = if cell.is_blank() {
            "__EMPTY".to_string()
        } else {
            cell.to_string()
        };

        let name = match seen.get(&base).copied() {
            Some(mut count) => {
                let mut candidate = format!("{base}_{count}");
                count += 1;
                while seen.contains_key(&candidate) {
                    candidate = format!("{base}_{count}");
                    count += 1;
                }
                seen.insert(base.clone(), count);
                seen.insert(candidate.clone(), 1);
                candidate
            }
            None => {
                seen.insert(base.clone(), 1);
                base
            }
        };
        names.push(name);
    }

    names
}
