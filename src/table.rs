//! In-memory tabular values passed between pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar cell
///
/// Serializes untagged, so a row renders as plain JSON scalars and a YAML
/// `fill_value: Unknown` deserializes straight into `Cell::Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Storage type of a column once it is registered with a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    BigInt,
    Double,
    Varchar,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Varchar => "VARCHAR",
        }
    }

    /// Convert a cell so it binds cleanly to a column of this type
    pub fn coerce(&self, cell: &Cell) -> Cell {
        match (self, cell) {
            (_, Cell::Null) => Cell::Null,
            (SqlType::Double, Cell::Int(i)) => Cell::Float(*i as f64),
            (SqlType::Varchar, Cell::Text(_)) => cell.clone(),
            (SqlType::Varchar, other) => Cell::Text(other.to_string()),
            _ => cell.clone(),
        }
    }
}

/// A row-ordered table with named columns
///
/// Every row has exactly one cell per column; [`Table::new`] enforces it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Raised when rows do not match the column count
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row} has {found} cells, expected {expected}")]
pub struct ShapeError {
    pub row: usize,
    pub found: usize,
    pub expected: usize,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, ShapeError> {
        let expected = columns.len();
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(ShapeError {
                row,
                found: cells.len(),
                expected,
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from string column names, mostly for tests and fixtures
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, ShapeError> {
        Self::new(columns.into_iter().map(Into::into).collect(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Storage type for each column, inferred from the non-null cells
    pub fn sql_types(&self) -> Vec<SqlType> {
        (0..self.width())
            .map(|idx| infer_sql_type(self.rows.iter().map(|row| &row[idx])))
            .collect()
    }

    /// Rows sorted by their display form, for order-insensitive comparison
    pub fn sorted_rows(&self) -> Vec<Vec<Cell>> {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| row.iter().map(|c| format!("{:?}", c)).collect::<Vec<_>>());
        rows
    }
}

fn infer_sql_type<'a>(cells: impl Iterator<Item = &'a Cell>) -> SqlType {
    let mut inferred: Option<SqlType> = None;
    for cell in cells {
        let this = match cell {
            Cell::Null => continue,
            Cell::Bool(_) => SqlType::Boolean,
            Cell::Int(_) => SqlType::BigInt,
            Cell::Float(_) => SqlType::Double,
            Cell::Text(_) => return SqlType::Varchar,
        };
        inferred = Some(match (inferred, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(SqlType::BigInt), SqlType::Double) | (Some(SqlType::Double), SqlType::BigInt) => {
                SqlType::Double
            }
            _ => return SqlType::Varchar,
        });
    }
    inferred.unwrap_or(SqlType::Varchar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Table::from_rows(
            ["id", "name"],
            vec![vec![Cell::Int(1), "A".into()], vec![Cell::Int(2)]],
        )
        .unwrap_err();
        assert_eq!(err.row, 1);
        assert_eq!(err.found, 1);
        assert_eq!(err.expected, 2);
    }

    #[test]
    fn test_sql_type_inference() {
        let table = Table::from_rows(
            ["flag", "id", "price", "name", "empty", "mixed"],
            vec![
                vec![
                    true.into(),
                    Cell::Int(1),
                    Cell::Int(1),
                    "a".into(),
                    Cell::Null,
                    Cell::Int(1),
                ],
                vec![
                    Cell::Null,
                    Cell::Int(2),
                    Cell::Float(2.5),
                    Cell::Null,
                    Cell::Null,
                    "Unknown".into(),
                ],
            ],
        )
        .unwrap();

        assert_eq!(
            table.sql_types(),
            vec![
                SqlType::Boolean,
                SqlType::BigInt,
                SqlType::Double,
                SqlType::Varchar,
                SqlType::Varchar,
                SqlType::Varchar,
            ]
        );
    }

    #[test]
    fn test_coerce() {
        assert_eq!(SqlType::Double.coerce(&Cell::Int(3)), Cell::Float(3.0));
        assert_eq!(SqlType::Varchar.coerce(&Cell::Int(3)), Cell::Text("3".into()));
        assert_eq!(SqlType::Varchar.coerce(&Cell::Null), Cell::Null);
        assert_eq!(SqlType::BigInt.coerce(&Cell::Int(3)), Cell::Int(3));
    }

    #[test]
    fn test_column_access() {
        let table = Table::from_rows(
            ["id", "name"],
            vec![vec![Cell::Int(1), "A".into()], vec![Cell::Int(2), Cell::Null]],
        )
        .unwrap();

        let names: Vec<_> = table.column("name").unwrap().cloned().collect();
        assert_eq!(names, vec![Cell::Text("A".into()), Cell::Null]);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_cell_serializes_as_plain_json() {
        let row = vec![Cell::Null, Cell::Int(1), Cell::Text("x".into())];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[null,1,"x"]"#);
    }
}
