//! Delimited file reading with per-column type inference

use crate::error::{EtlError, Result};
use crate::etl::Extractor;
use crate::table::{Cell, Table};
use std::collections::HashSet;
use std::path::Path;

/// Field values read as null, matching the usual dataframe defaults
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#NA", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Read a CSV file with a header row into a [`Table`]
///
/// Each column gets the narrowest kind all of its non-null fields parse as:
/// integer, then float, then boolean, falling back to text.
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read the whole file
    ///
    /// # Errors
    /// `SourceUnavailable` if the file cannot be opened, has no header, has
    /// an empty or duplicate column name (compared case-insensitively), or a
    /// record's field count differs from the header's
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let locator = path.display().to_string();
        let unavailable = |reason: &dyn std::fmt::Display| EtlError::source_unavailable(&locator, reason);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_path(path)
            .map_err(|e| unavailable(&e))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| unavailable(&e))?
            .iter()
            .map(str::to_string)
            .collect();

        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(unavailable(&"missing header row"));
        }
        if let Some(position) = columns.iter().position(|c| c.trim().is_empty()) {
            return Err(unavailable(&format!(
                "empty column name at position {}",
                position + 1
            )));
        }
        // DuckDB identifiers are case-insensitive
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.to_lowercase())) {
            return Err(unavailable(&format!("duplicate column '{}'", dup)));
        }

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| unavailable(&e))?;

        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|idx| infer_kind(records.iter().filter_map(|r| r.get(idx))))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .zip(&kinds)
                    .map(|(field, kind)| parse_field(field, *kind))
                    .collect()
            })
            .collect();

        log::debug!(
            "Read {} rows x {} columns from {}",
            records.len(),
            columns.len(),
            locator
        );

        Table::new(columns, rows).map_err(|e| unavailable(&e))
    }
}

impl Extractor for CsvReader {
    fn extract(&self, locator: &str) -> Result<Table> {
        log::info!("Extracting data from {}", locator);
        self.read(locator)
    }
}

fn is_null(field: &str) -> bool {
    NULL_MARKERS.contains(&field)
}

fn parse_bool(field: &str) -> Option<bool> {
    match field {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn infer_kind<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut int = true;
    let mut float = true;
    let mut boolean = true;
    for field in fields.filter(|f| !is_null(f)) {
        int = int && field.parse::<i64>().is_ok();
        float = float && field.parse::<f64>().is_ok();
        boolean = boolean && parse_bool(field).is_some();
        if !(int || float || boolean) {
            return ColumnKind::Text;
        }
    }
    if int {
        ColumnKind::Int
    } else if float {
        ColumnKind::Float
    } else if boolean {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn parse_field(field: &str, kind: ColumnKind) -> Cell {
    if is_null(field) {
        return Cell::Null;
    }
    let parsed = match kind {
        ColumnKind::Int => field.parse().ok().map(Cell::Int),
        ColumnKind::Float => field.parse().ok().map(Cell::Float),
        ColumnKind::Bool => parse_bool(field).map(Cell::Bool),
        ColumnKind::Text => None,
    };
    parsed.unwrap_or_else(|| Cell::Text(field.to_string()))
}
