//! Pipeline orchestration for ETL runs

use super::{Extractor, Loader, Transformer};
use crate::error::{EntityFailure, PipelineError, Stage};
use crate::storage::WorkItem;
use crate::transform::TransformRegistry;
use std::str::FromStr;

/// What the pipeline does when an entity fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the run at the first failed entity
    #[default]
    FailFast,
    /// Attempt every entity and report all failures at the end
    Continue,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(ErrorPolicy::FailFast),
            "continue" | "keep-going" => Ok(ErrorPolicy::Continue),
            other => Err(format!(
                "unknown error policy '{}', expected 'fail-fast' or 'continue'",
                other
            )),
        }
    }
}

/// Summary of a pipeline run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Entities that were loaded, with their row counts, in processing order
    pub loaded: Vec<(String, usize)>,
    /// Entities that failed, with the stage they failed in, in processing order
    pub failures: Vec<EntityFailure>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.loaded.iter().map(|(_, rows)| rows).sum()
    }
}

/// ETL Pipeline that drives each work item through extract, transform and load
///
/// # Type Parameters
/// - `E`: Extractor reading each item's locator
/// - `L`: Loader writing each cleaned table under the entity name
///
/// The transformer is not a type parameter: it is looked up per entity in
/// the [`TransformRegistry`].
///
/// # Example
/// ```no_run
/// use duckload::etl::{ErrorPolicy, Pipeline};
/// use duckload::storage::{CsvReader, WorkItem};
/// use duckload::store::{DuckDbStore, TableLoader};
/// use duckload::transform::TransformRegistry;
///
/// # fn example() -> eyre::Result<()> {
/// let store = DuckDbStore::open("mydata.db")?;
/// let pipeline = Pipeline::new(
///     CsvReader::new(),
///     TransformRegistry::builtin(),
///     TableLoader::new(&store),
/// )
/// .with_policy(ErrorPolicy::FailFast);
///
/// let report = pipeline.process(&[WorkItem::new("products", "data/products.csv")])?;
/// println!("Loaded {} rows", report.total_rows());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, L> {
    extractor: E,
    registry: TransformRegistry,
    loader: L,
    policy: ErrorPolicy,
}

impl<E, L> Pipeline<E, L>
where
    E: Extractor,
    L: Loader,
{
    /// Create a new fail-fast pipeline
    pub fn new(extractor: E, registry: TransformRegistry, loader: L) -> Self {
        Self {
            extractor,
            registry,
            loader,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Run every work item in order
    ///
    /// Every name is resolved before any source is read, so an unknown
    /// entity never triggers extract or load side effects. Under `Continue`
    /// an unknown entity is reported at its place in the work list.
    ///
    /// # Errors
    /// - `PipelineError::Aborted` with the first failure under `FailFast`
    /// - `PipelineError::Incomplete` with the full report under `Continue`
    pub fn process(&self, items: &[WorkItem]) -> Result<RunReport, PipelineError> {
        log::info!("Starting the ETL process for {} entities", items.len());
        let mut report = RunReport::default();

        let unknown = self.registry.unknown(items.iter().map(|item| item.name.as_str()));
        if self.policy == ErrorPolicy::FailFast
            && let Some(name) = unknown.first()
        {
            let failure = EntityFailure::unknown_entity(name);
            log::error!("{}", failure);
            return Err(PipelineError::Aborted(failure));
        }

        for item in items {
            if unknown.contains(&item.name.as_str()) {
                let failure = EntityFailure::unknown_entity(&item.name);
                log::error!("{}", failure);
                report.failures.push(failure);
                continue;
            }

            match self.process_item(item) {
                Ok(rows) => report.loaded.push((item.name.clone(), rows)),
                Err(failure) => {
                    log::error!("{}", failure);
                    match self.policy {
                        ErrorPolicy::FailFast => return Err(PipelineError::Aborted(failure)),
                        ErrorPolicy::Continue => report.failures.push(failure),
                    }
                }
            }
        }

        log::info!(
            "ETL process finished: {} loaded, {} failed",
            report.loaded.len(),
            report.failures.len()
        );

        if report.failures.is_empty() {
            Ok(report)
        } else {
            Err(PipelineError::Incomplete(report))
        }
    }

    fn process_item(&self, item: &WorkItem) -> Result<usize, EntityFailure> {
        let entity = item.name.as_str();
        log::info!("Processing {} from {}", entity, item.locator);

        let rule = self
            .registry
            .resolve(entity)
            .map_err(|e| EntityFailure::new(entity, Stage::Resolve, e))?;

        log::debug!("Extracting data from {}", item.locator);
        let raw = self
            .extractor
            .extract(&item.locator)
            .map_err(|e| EntityFailure::new(entity, Stage::Extract, e))?;
        log::info!("Extracted {} rows", raw.len());

        log::debug!("Transforming data with {}", rule.name());
        let cleaned = rule
            .transform(raw)
            .map_err(|e| EntityFailure::new(entity, Stage::Transform, e))?;
        log::info!("Transformed to {} rows", cleaned.len());

        log::debug!("Loading data into {}", entity);
        let count = self
            .loader
            .load(cleaned, entity)
            .map_err(|e| EntityFailure::new(entity, Stage::Load, e))?;
        log::info!("Loaded {} rows into {}", count, entity);

        Ok(count)
    }
}
