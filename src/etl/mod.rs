//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Each entity flows through one extractor, the transformer registered for
//! its name, and a loader that materializes the result as a table.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{ErrorPolicy, Pipeline, RunReport};
pub use transform::Transformer;
