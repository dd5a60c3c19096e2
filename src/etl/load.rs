//! Loader trait for materializing tables in a destination

use crate::error::Result;
use crate::table::Table;

/// Loader trait for writing a table under a target name
///
/// After a successful load the target holds exactly the rows of `table`.
///
/// # Example
/// ```no_run
/// use duckload::etl::Loader;
/// use duckload::error::Result;
/// use duckload::table::Table;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     fn load(&self, table: Table, _target: &str) -> Result<usize> {
///         Ok(table.len())
///     }
/// }
/// ```
pub trait Loader {
    /// Load the table, replacing any previous contents of `target`
    ///
    /// Returns the number of rows written
    ///
    /// # Errors
    /// Returns `LoadFailed` if the destination rejects the write
    fn load(&self, table: Table, target: &str) -> Result<usize>;
}
