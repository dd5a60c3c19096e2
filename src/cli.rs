//! CLI helper functions

use crate::{
    config::Settings,
    error::{EntityFailure, PipelineError},
    etl::{ErrorPolicy, Pipeline, RunReport, Transformer},
    storage::{CsvReader, WorkItem, WorkList},
    store::{DuckDbStore, TableLoader, TableStore, quote_ident},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::{Map, Value};
use std::path::Path;

/// Options for `duckload run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Database file, overriding environment and work list
    pub database: Option<String>,
    /// Keep processing after a failed entity
    pub keep_going: bool,
    /// Only process entities whose name matches this regex
    pub include: Option<String>,
    /// Skip entities whose name matches this regex
    pub exclude: Option<String>,
}

/// Apply include/exclude regex filters to the work items, include first
pub fn select_items(
    items: Vec<WorkItem>,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<Vec<WorkItem>> {
    let mut items = items;

    if let Some(include_pattern) = include {
        let regex = regex::Regex::new(include_pattern)
            .with_context(|| format!("Invalid include regex pattern: {}", include_pattern))?;
        items.retain(|item| regex.is_match(&item.name));
        log::info!(
            "After include filter '{}': {} entit(ies)",
            include_pattern,
            items.len()
        );
    }

    if let Some(exclude_pattern) = exclude {
        let regex = regex::Regex::new(exclude_pattern)
            .with_context(|| format!("Invalid exclude regex pattern: {}", exclude_pattern))?;
        items.retain(|item| !regex.is_match(&item.name));
        log::info!(
            "After exclude filter '{}': {} entit(ies)",
            exclude_pattern,
            items.len()
        );
    }

    Ok(items)
}

/// Run the work list into the database
///
/// Pipeline per entity: CsvReader → registered CleaningRule → TableLoader
///
/// The store is opened once and closed when the run ends, whether or not
/// the run succeeded.
pub fn run_work_list(
    work_list: impl AsRef<Path>,
    options: &RunOptions,
    settings: &Settings,
) -> Result<RunReport> {
    let work_list = work_list.as_ref();

    log::info!("Loading work list from {}", work_list.display().bright_black());
    let list = WorkList::read(work_list)?;
    let items = select_items(
        list.items(),
        options.include.as_deref(),
        options.exclude.as_deref(),
    )?;

    let database = settings.database(options.database.as_deref(), list.database.as_deref());
    let policy = settings.error_policy(options.keep_going);
    log::info!(
        "Loading {} entit(ies) into {} ({:?})",
        items.len(),
        database.bright_black(),
        policy
    );

    // fail fast on unknown names before the database file is touched
    let registry = list.registry();
    let unknown = registry.unknown(items.iter().map(|item| item.name.as_str()));
    if policy == ErrorPolicy::FailFast
        && let Some(name) = unknown.first()
    {
        let failure = EntityFailure::unknown_entity(name);
        log::error!("{}", failure.red());
        return Err(PipelineError::Aborted(failure)).wrap_err("ETL run aborted");
    }

    let store = DuckDbStore::open(&database)?;
    let outcome = {
        let pipeline = Pipeline::new(
            CsvReader::new().with_delimiter(list.delimiter_byte()?),
            registry,
            TableLoader::new(&store),
        )
        .with_policy(policy);
        pipeline.process(&items)
    };

    if let Err(e) = store.close() {
        log::warn!("Failed to close database {}: {}", database, e);
    }

    match outcome {
        Ok(report) => Ok(report),
        Err(PipelineError::Incomplete(report)) => {
            for failure in &report.failures {
                log::error!("{}", failure.red());
            }
            Err(PipelineError::Incomplete(report)).wrap_err("ETL run incomplete")
        }
        Err(e) => Err(e).wrap_err("ETL run aborted"),
    }
}

/// Validate a work list without reading any snapshot or database
///
/// Returns the number of entities that would be processed
pub fn check_work_list(work_list: impl AsRef<Path>) -> Result<usize> {
    let work_list = work_list.as_ref();
    let list = WorkList::read(work_list)?;
    let registry = list.registry();

    registry
        .validate(list.names())
        .with_context(|| format!("Work list {} is not runnable", work_list.display()))?;

    for item in list.items() {
        let rule = registry.resolve(&item.name)?;
        log::info!(
            "✓ {} ← {} (rule: {})",
            item.name.cyan(),
            item.locator.bright_black(),
            rule.name()
        );
    }

    Ok(list.count())
}

/// Fetch up to `limit` rows of a table as JSON objects
pub fn show_table(database: &str, table: &str, limit: usize) -> Result<Vec<Value>> {
    let store = DuckDbStore::open(database)?;
    let data = store
        .query(&format!("SELECT * FROM {} LIMIT {}", quote_ident(table), limit))
        .with_context(|| format!("Failed to read table {} from {}", table, database))?;

    let rows = data
        .rows()
        .iter()
        .map(|row| -> Result<Value> {
            let object: Map<String, Value> = data
                .columns()
                .iter()
                .cloned()
                .zip(row.iter().map(serde_json::to_value))
                .map(|(column, value)| value.map(|v| (column, v)))
                .collect::<std::result::Result<_, _>>()?;
            Ok(Value::Object(object))
        })
        .collect::<Result<Vec<_>>>()?;

    store.close()?;
    Ok(rows)
}
