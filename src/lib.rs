//! duckload
//!
//! Loads cleaned CSV snapshots into DuckDB tables, one table per entity,
//! replacing the previous contents on every rerun.

pub mod cli;
pub mod config;
pub mod error;
pub mod etl;
pub mod storage;
pub mod store;
pub mod table;
pub mod transform;

// Re-exports for convenience
pub use error::{EtlError, PipelineError, StoreError};
pub use etl::{ErrorPolicy, Extractor, Loader, Pipeline, RunReport, Transformer};
pub use storage::{CsvReader, WorkItem, WorkList};
pub use store::{DuckDbStore, TableLoader, TableStore};
pub use table::{Cell, Table};
pub use transform::{CleaningRule, RuleConfig, TransformRegistry};
