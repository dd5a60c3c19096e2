//! Null filling

use crate::error::{EtlError, Result};
use crate::etl::Transformer;
use crate::table::{Cell, Table};

/// Transformer that replaces every null cell with a sentinel value
///
/// Non-null cells pass through untouched.
///
/// # Example
/// ```
/// use duckload::etl::Transformer;
/// use duckload::table::{Cell, Table};
/// use duckload::transform::NullFiller;
///
/// let filler = NullFiller::new("Unknown");
/// let input = Table::from_rows(["name"], vec![vec![Cell::Null]]).unwrap();
///
/// let output = filler.transform(input).unwrap();
/// assert_eq!(output.rows()[0][0], Cell::Text("Unknown".into()));
/// ```
pub struct NullFiller {
    value: Cell,
}

impl NullFiller {
    pub fn new(value: impl Into<Cell>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Cell {
        &self.value
    }
}

impl Default for NullFiller {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

impl Transformer for NullFiller {
    fn name(&self) -> &str {
        "fill"
    }

    fn transform(&self, input: Table) -> Result<Table> {
        let (columns, rows) = input.into_parts();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        Cell::Null => self.value.clone(),
                        other => other,
                    })
                    .collect()
            })
            .collect();

        Table::new(columns, rows).map_err(|e| EtlError::transformation(self.name(), e.to_string()))
    }
}
