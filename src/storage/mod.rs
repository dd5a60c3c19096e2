//! File system inputs
//!
//! This module handles the files a run reads:
//! - CSV snapshots
//! - The YAML work list

mod delimited;
mod worklist;

pub use delimited::CsvReader;
pub use worklist::{EntityEntry, WorkItem, WorkList};
