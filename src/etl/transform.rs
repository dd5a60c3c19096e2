//! Transformer trait for cleaning tables

use crate::error::Result;
use crate::table::Table;

/// Transformer trait for turning one table into another
///
/// Transformers take the table by value and hand back a new one, so steps
/// can be chained and tested in isolation:
/// - Deduplication
/// - Row filtering
/// - Null filling
///
/// # Example
/// ```
/// use duckload::etl::Transformer;
/// use duckload::error::Result;
/// use duckload::table::Table;
///
/// struct DropAllRows;
///
/// impl Transformer for DropAllRows {
///     fn name(&self) -> &str {
///         "drop_all_rows"
///     }
///
///     fn transform(&self, input: Table) -> Result<Table> {
///         let (columns, _) = input.into_parts();
///         Ok(Table::new(columns, Vec::new()).unwrap())
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Transform a table
    ///
    /// # Errors
    /// Returns `Transformation` if the input violates the rule, e.g. a
    /// column the rule depends on is missing
    fn transform(&self, input: Table) -> Result<Table>;
}
