//! Duplicate row removal
//!
//! Keeps the first occurrence of every distinct key, where the key is a
//! configured subset of columns or the whole row.

use crate::error::{EtlError, Result};
use crate::etl::Transformer;
use crate::table::{Cell, Table};
use std::collections::HashSet;

/// Transformer that drops rows whose key was already seen
///
/// Row order of the survivors is the source order, so the outcome does not
/// depend on hashing or platform.
///
/// # Example
/// ```
/// use duckload::etl::Transformer;
/// use duckload::table::{Cell, Table};
/// use duckload::transform::Deduplicator;
///
/// let dedup = Deduplicator::on_columns(vec!["id"]);
/// let input = Table::from_rows(
///     ["id", "name"],
///     vec![
///         vec![Cell::Int(1), "first".into()],
///         vec![Cell::Int(1), "second".into()],
///     ],
/// )
/// .unwrap();
///
/// let output = dedup.transform(input).unwrap();
/// assert_eq!(output.len(), 1);
/// assert_eq!(output.rows()[0][1], Cell::Text("first".into()));
/// ```
pub struct Deduplicator {
    subset: Option<Vec<String>>,
}

impl Deduplicator {
    /// Compare whole rows
    pub fn all_columns() -> Self {
        Self { subset: None }
    }

    /// Compare only the given columns; an empty list means whole rows
    pub fn on_columns(columns: Vec<&str>) -> Self {
        Self::new(Some(columns.iter().map(|s| s.to_string()).collect()))
    }

    pub fn new(subset: Option<Vec<String>>) -> Self {
        Self {
            subset: subset.filter(|cols| !cols.is_empty()),
        }
    }

    fn key_indices(&self, table: &Table) -> Result<Vec<usize>> {
        match &self.subset {
            None => Ok((0..table.width()).collect()),
            Some(columns) => columns
                .iter()
                .map(|col| {
                    table.column_index(col).ok_or_else(|| {
                        EtlError::transformation(
                            self.name(),
                            format!("duplicate key column '{}' not found", col),
                        )
                    })
                })
                .collect(),
        }
    }
}

/// Hashable view of a cell; nulls compare equal and floats by bit pattern
#[derive(Hash, PartialEq, Eq)]
enum KeyPart<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(&'a str),
}

impl<'a> From<&'a Cell> for KeyPart<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Null => KeyPart::Null,
            Cell::Bool(b) => KeyPart::Bool(*b),
            Cell::Int(i) => KeyPart::Int(*i),
            Cell::Float(x) => KeyPart::Float(x.to_bits()),
            Cell::Text(s) => KeyPart::Text(s),
        }
    }
}

impl Transformer for Deduplicator {
    fn name(&self) -> &str {
        "deduplicate"
    }

    fn transform(&self, input: Table) -> Result<Table> {
        let indices = self.key_indices(&input)?;
        let (columns, rows) = input.into_parts();

        let keep: Vec<bool> = {
            let mut seen: HashSet<Vec<KeyPart>> = HashSet::with_capacity(rows.len());
            rows.iter()
                .map(|row| seen.insert(indices.iter().map(|&i| KeyPart::from(&row[i])).collect()))
                .collect()
        };

        let before = rows.len();
        let kept: Vec<Vec<Cell>> = rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();
        log::debug!("Dropped {} duplicate rows", before - kept.len());

        Table::new(columns, kept).map_err(|e| EtlError::transformation(self.name(), e.to_string()))
    }
}
