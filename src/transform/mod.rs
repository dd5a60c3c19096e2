//! Cleaning transformations and the registry that dispatches them by entity

mod cleaning_rule;
mod deduplicator;
mod null_filler;
mod registry;
mod row_filter;

pub use cleaning_rule::{CleaningRule, RuleConfig};
pub use deduplicator::Deduplicator;
pub use null_filler::NullFiller;
pub use registry::TransformRegistry;
pub use row_filter::RowFilter;
