//! Per-entity cleaning rules

use super::{Deduplicator, NullFiller, RowFilter};
use crate::error::Result;
use crate::etl::Transformer;
use crate::table::{Cell, Table};
use serde::{Deserialize, Serialize};

/// Cleaning parameters for one entity, as written in the work list
///
/// ```yaml
/// duplicates_subset: [type, company, firstName]
/// fill_value: Unknown
/// filter_column: isActive
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Columns compared for duplicates; absent or empty compares whole rows
    #[serde(default)]
    pub duplicates_subset: Option<Vec<String>>,
    /// Sentinel written into every null cell
    #[serde(default = "default_fill_value")]
    pub fill_value: Cell,
    /// Boolean column a row must have set to survive
    #[serde(default)]
    pub filter_column: Option<String>,
}

fn default_fill_value() -> Cell {
    Cell::Text("Unknown".to_string())
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            duplicates_subset: None,
            fill_value: default_fill_value(),
            filter_column: None,
        }
    }
}

impl RuleConfig {
    pub fn with_subset(mut self, columns: &[&str]) -> Self {
        self.duplicates_subset = Some(columns.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_filter(mut self, column: &str) -> Self {
        self.filter_column = Some(column.to_string());
        self
    }
}

/// A composed rule: dedup, then the optional filter, then fill
///
/// Duplicate keys are compared on the raw cells, and a null filter flag
/// drops the row before fill could replace it.
pub struct CleaningRule {
    name: String,
    dedup: Deduplicator,
    filter: Option<RowFilter>,
    fill: NullFiller,
}

impl CleaningRule {
    pub fn from_config(name: impl Into<String>, config: &RuleConfig) -> Self {
        Self {
            name: name.into(),
            dedup: Deduplicator::new(config.duplicates_subset.clone()),
            filter: config.filter_column.as_deref().map(RowFilter::new),
            fill: NullFiller::new(config.fill_value.clone()),
        }
    }
}

impl Transformer for CleaningRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, input: Table) -> Result<Table> {
        let mut table = self.dedup.transform(input)?;
        if let Some(filter) = &self.filter {
            table = filter.transform(table)?;
        }
        self.fill.transform(table)
    }
}
