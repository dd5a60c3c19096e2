//! Create-or-replace loading through a staging relation

use super::{TableStore, quote_ident, staging_name};
use crate::error::{EtlError, LoadStep, Result, StoreError};
use crate::etl::Loader;
use crate::table::Table;

/// Loader that materializes each table as a persistent relation in a store
///
/// The first load of a name creates the table from the cleaned rows. Every
/// later load keeps the table and swaps its rows:
///
/// 1. register the rows as `__staging_<name>`
/// 2. `DELETE FROM <name>`
/// 3. `INSERT INTO <name> SELECT * FROM __staging_<name>`
/// 4. release the staging relation
///
/// Steps 2 and 3 run inside a transaction when the store has them. The
/// staging relation is released on every exit path.
pub struct TableLoader<'s, S: TableStore> {
    store: &'s S,
}

impl<'s, S: TableStore> TableLoader<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Existence probe; a failing probe counts as "absent"
    fn exists(&self, table: &str) -> bool {
        match self.store.table_exists(table) {
            Ok(exists) => exists,
            Err(e) => {
                log::warn!(
                    "Existence check for table {} failed, treating it as absent: {}",
                    table,
                    e
                );
                false
            }
        }
    }

    fn create(&self, table: &str, staging: &str) -> std::result::Result<(), Failure> {
        self.store
            .execute(&format!(
                "CREATE TABLE {} AS SELECT * FROM {}",
                quote_ident(table),
                quote_ident(staging)
            ))
            .map(|_| ())
            .map_err(|e| Failure::new(LoadStep::Create, false, e))
    }

    fn replace(&self, table: &str, staging: &str) -> std::result::Result<(), Failure> {
        let delete = format!("DELETE FROM {}", quote_ident(table));
        let insert = format!(
            "INSERT INTO {} SELECT * FROM {}",
            quote_ident(table),
            quote_ident(staging)
        );

        if !self.store.supports_transactions() {
            self.store
                .execute(&delete)
                .map_err(|e| Failure::new(LoadStep::Delete, false, e))?;
            // from here on a failure leaves the table emptied
            self.store
                .execute(&insert)
                .map_err(|e| Failure::new(LoadStep::Insert, true, e))?;
            return Ok(());
        }

        self.store
            .begin()
            .map_err(|e| Failure::new(LoadStep::Delete, false, e))?;

        let swapped = self
            .store
            .execute(&delete)
            .map_err(|e| Failure::new(LoadStep::Delete, false, e))
            .and_then(|_| {
                self.store
                    .execute(&insert)
                    .map_err(|e| Failure::new(LoadStep::Insert, false, e))
            })
            .and_then(|_| {
                self.store
                    .commit()
                    .map_err(|e| Failure::new(LoadStep::Commit, false, e))
            });

        if let Err(mut failure) = swapped {
            if let Err(e) = self.store.rollback() {
                log::error!("Rollback of table {} failed: {}", table, e);
                failure.partial = true;
            }
            return Err(failure);
        }
        Ok(())
    }
}

/// A failed statement before it is tagged with the table name
struct Failure {
    step: LoadStep,
    partial: bool,
    source: StoreError,
}

impl Failure {
    fn new(step: LoadStep, partial: bool, source: StoreError) -> Self {
        Self {
            step,
            partial,
            source,
        }
    }

    fn into_error(self, table: &str) -> EtlError {
        EtlError::LoadFailed {
            table: table.to_string(),
            step: self.step,
            partial: self.partial,
            source: self.source,
        }
    }
}

impl<S: TableStore> Loader for TableLoader<'_, S> {
    fn load(&self, data: Table, target: &str) -> Result<usize> {
        log::info!("Loading data into {}", target);
        let rows = data.len();
        let staging = staging_name(target);
        let exists = self.exists(target);

        if let Err(e) = self.store.register_relation(&staging, &data) {
            // a failed registration may still have created the relation
            if let Err(release) = self.store.unregister_relation(&staging) {
                log::error!("Failed to release staging relation {}: {}", staging, release);
            }
            return Err(Failure::new(LoadStep::Register, false, e).into_error(target));
        }

        let written = if exists {
            log::warn!(
                "Table {} already exists. Skip table creation. Only override data.",
                target
            );
            self.replace(target, &staging)
        } else {
            log::debug!("Table {} does not exist, creating it", target);
            self.create(target, &staging)
        };

        let released = self.store.unregister_relation(&staging);

        match (written, released) {
            (Ok(()), Ok(())) => Ok(rows),
            (Ok(()), Err(e)) => Err(Failure::new(LoadStep::Release, false, e).into_error(target)),
            (Err(failure), released) => {
                if let Err(e) = released {
                    log::error!("Failed to release staging relation {}: {}", staging, e);
                }
                Err(failure.into_error(target))
            }
        }
    }
}
