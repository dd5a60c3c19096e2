//! DuckDB-backed table store

use super::{TableStore, quote_ident};
use crate::error::{EtlError, StoreError};
use crate::table::{Cell, Table};
use duckdb::types::{ToSql, ToSqlOutput, Value, ValueRef};
use duckdb::{Connection, params, params_from_iter};
use std::path::Path;

/// Location string that opens a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// A single DuckDB connection held for the duration of a run
///
/// Relations are registered as `TEMP` tables, which live only as long as
/// the connection, so a crashed run cannot leave a staging name behind.
pub struct DuckDbStore {
    conn: Connection,
    location: String,
}

impl DuckDbStore {
    /// Open (or create) a database file; `:memory:` opens an in-memory one
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the connection cannot be established
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let location = path.as_ref().display().to_string();
        let conn = if location == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(path.as_ref())
        }
        .map_err(|e| EtlError::StoreUnavailable {
            location: location.clone(),
            source: e.into(),
        })?;

        log::debug!("Opened DuckDB store at {}", location);
        Ok(Self { conn, location })
    }

    pub fn open_in_memory() -> crate::error::Result<Self> {
        Self::open(IN_MEMORY)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Close the connection, surfacing any error instead of dropping it
    pub fn close(self) -> Result<(), StoreError> {
        log::debug!("Closing DuckDB store at {}", self.location);
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn insert_rows(&self, ident: &str, table: &Table) -> Result<(), StoreError> {
        let types = table.sql_types();
        let placeholders = vec!["?"; table.width()].join(", ");
        let mut stmt = self
            .conn
            .prepare(&format!("INSERT INTO {} VALUES ({})", ident, placeholders))?;

        for row in table.rows() {
            let cells: Vec<Cell> = row
                .iter()
                .zip(&types)
                .map(|(cell, ty)| ty.coerce(cell))
                .collect();
            stmt.execute(params_from_iter(cells.iter()))?;
        }
        Ok(())
    }
}

impl TableStore for DuckDbStore {
    fn execute(&self, sql: &str) -> Result<usize, StoreError> {
        log::trace!("execute: {}", sql);
        Ok(self.conn.execute(sql, [])?)
    }

    fn query(&self, sql: &str) -> Result<Table, StoreError> {
        log::trace!("query: {}", sql);
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let columns: Vec<String> = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let cells = (0..columns.len())
                .map(|idx| row.get::<_, Value>(idx).map(cell_from_value))
                .collect::<duckdb::Result<Vec<_>>>()?;
            data.push(cells);
        }

        Table::new(columns, data).map_err(|e| StoreError::Other(e.to_string()))
    }

    fn register_relation(&self, name: &str, table: &Table) -> Result<(), StoreError> {
        if table.width() == 0 {
            return Err(StoreError::Other(format!(
                "cannot register '{}': table has no columns",
                name
            )));
        }

        let ident = quote_ident(name);
        let columns = table
            .columns()
            .iter()
            .zip(table.sql_types())
            .map(|(col, ty)| format!("{} {}", quote_ident(col), ty.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} ({})",
            ident, columns
        ))?;

        if table.is_empty() {
            return Ok(());
        }

        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match self.insert_rows(&ident, table) {
            Ok(()) => self.conn.execute_batch("COMMIT")?,
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("Rollback after failed registration of {} failed: {}", name, rollback);
                }
                return Err(e);
            }
        }

        log::debug!("Registered {} rows as {}", table.len(), name);
        Ok(())
    }

    fn unregister_relation(&self, name: &str) -> Result<(), StoreError> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS temp.main.{}", quote_ident(name)))?;
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_catalog = current_database() \
             AND table_schema = current_schema() \
             AND lower(table_name) = lower(?)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn supports_transactions(&self) -> bool {
        true
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Bool(b) => ToSqlOutput::Owned(Value::Boolean(*b)),
            Cell::Int(i) => ToSqlOutput::Owned(Value::BigInt(*i)),
            Cell::Float(x) => ToSqlOutput::Owned(Value::Double(*x)),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn cell_from_value(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Boolean(b) => Cell::Bool(b),
        Value::TinyInt(i) => Cell::Int(i.into()),
        Value::SmallInt(i) => Cell::Int(i.into()),
        Value::Int(i) => Cell::Int(i.into()),
        Value::BigInt(i) => Cell::Int(i),
        Value::UTinyInt(i) => Cell::Int(i.into()),
        Value::USmallInt(i) => Cell::Int(i.into()),
        Value::UInt(i) => Cell::Int(i.into()),
        Value::UBigInt(i) => i64::try_from(i)
            .map(Cell::Int)
            .unwrap_or_else(|_| Cell::Text(i.to_string())),
        Value::HugeInt(i) => i64::try_from(i)
            .map(Cell::Int)
            .unwrap_or_else(|_| Cell::Text(i.to_string())),
        Value::Float(x) => Cell::Float(x.into()),
        Value::Double(x) => Cell::Float(x),
        Value::Text(s) => Cell::Text(s),
        other => Cell::Text(format!("{:?}", other)),
    }
}
