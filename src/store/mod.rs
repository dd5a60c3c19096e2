//! Table store adapters and the loader that writes through them
//!
//! A store executes SQL and can expose an in-memory [`Table`] under a name
//! that later statements can select from. [`TableLoader`] builds the
//! create-or-replace protocol on top of that.

mod duckdb_store;
mod loader;

pub use duckdb_store::DuckDbStore;
pub use loader::TableLoader;

use crate::error::StoreError;
use crate::table::Table;

/// Prefix reserved for staging relations; no entity may use it
pub const STAGING_PREFIX: &str = "__staging_";

/// Staging relation name for a target table
pub fn staging_name(table: &str) -> String {
    format!("{}{}", STAGING_PREFIX, table)
}

/// Quote an identifier for use in SQL text
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The operations the loader needs from an embedded database
pub trait TableStore {
    /// Run one statement, returning the number of affected rows
    fn execute(&self, sql: &str) -> Result<usize, StoreError>;

    /// Run a query and collect its result
    fn query(&self, sql: &str) -> Result<Table, StoreError>;

    /// Expose `table` under `name` for subsequent statements
    fn register_relation(&self, name: &str, table: &Table) -> Result<(), StoreError>;

    /// Retract a registration; releasing an unknown name is not an error
    fn unregister_relation(&self, name: &str) -> Result<(), StoreError>;

    /// Whether `name` is a persistent table, without side effects
    fn table_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Whether `begin`/`commit`/`rollback` give all-or-nothing semantics
    fn supports_transactions(&self) -> bool {
        false
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.execute("BEGIN TRANSACTION").map(|_| ())
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.execute("COMMIT").map(|_| ())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        self.execute("ROLLBACK").map(|_| ())
    }

    /// Every row of a table
    fn read_table(&self, name: &str) -> Result<Table, StoreError> {
        self.query(&format!("SELECT * FROM {}", quote_ident(name)))
    }
}
