//! Extractor trait for reading tabular data from a source

use crate::error::Result;
use crate::table::Table;

/// Extractor trait for reading a whole table from a locator
///
/// Implementors define how a locator is resolved:
/// - Delimited files
/// - In-memory fixtures in tests
///
/// # Example
/// ```no_run
/// use duckload::etl::Extractor;
/// use duckload::error::Result;
/// use duckload::table::{Cell, Table};
///
/// struct FixtureExtractor;
///
/// impl Extractor for FixtureExtractor {
///     fn extract(&self, _locator: &str) -> Result<Table> {
///         Ok(Table::from_rows(["id"], vec![vec![Cell::Int(1)]]).unwrap())
///     }
/// }
/// ```
pub trait Extractor {
    /// Read the table behind `locator`
    ///
    /// # Errors
    /// Returns `SourceUnavailable` if the locator cannot be opened or parsed
    fn extract(&self, locator: &str) -> Result<Table>;
}
