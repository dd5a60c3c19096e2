//! Active-row filter

use crate::error::{EtlError, Result};
use crate::etl::Transformer;
use crate::table::{Cell, Table};

/// Transformer that keeps only rows whose boolean column is true
///
/// Nulls count as not true. Any non-boolean value is an error rather than
/// a guess.
pub struct RowFilter {
    column: String,
}

impl RowFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Filter on the `isActive` flag carried by contact exports
    pub fn active() -> Self {
        Self::new("isActive")
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Transformer for RowFilter {
    fn name(&self) -> &str {
        "filter"
    }

    fn transform(&self, input: Table) -> Result<Table> {
        let idx = input.column_index(&self.column).ok_or_else(|| {
            EtlError::transformation(
                self.name(),
                format!("filter column '{}' not found", self.column),
            )
        })?;

        let (columns, rows) = input.into_parts();
        let mut kept = Vec::with_capacity(rows.len());
        for (pos, row) in rows.into_iter().enumerate() {
            match &row[idx] {
                Cell::Bool(true) => kept.push(row),
                Cell::Bool(false) | Cell::Null => {}
                other => {
                    return Err(EtlError::transformation(
                        self.name(),
                        format!(
                            "column '{}' row {} holds non-boolean value '{}'",
                            self.column, pos, other
                        ),
                    ));
                }
            }
        }

        Table::new(columns, kept).map_err(|e| EtlError::transformation(self.name(), e.to_string()))
    }
}
