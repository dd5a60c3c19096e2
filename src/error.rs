//! Error kinds for the extract, transform and load stages

use std::fmt;

/// Errors raised by a table store adapter
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    #[error("{0}")]
    Other(String),
}

/// The statement of a load that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    Register,
    Create,
    Delete,
    Insert,
    Commit,
    Release,
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            LoadStep::Register => "register",
            LoadStep::Create => "create",
            LoadStep::Delete => "delete",
            LoadStep::Insert => "insert",
            LoadStep::Commit => "commit",
            LoadStep::Release => "release",
        };
        f.write_str(step)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Source {locator} is unavailable: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    #[error("No transformation rule registered for entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("Transformation '{rule}' failed: {reason}")]
    Transformation { rule: String, reason: String },

    #[error(
        "Failed to load table '{table}' ({step} failed{}): {source}",
        partial_note(.partial)
    )]
    LoadFailed {
        table: String,
        step: LoadStep,
        partial: bool,
        #[source]
        source: StoreError,
    },

    #[error("Store {location} is unavailable: {source}")]
    StoreUnavailable {
        location: String,
        #[source]
        source: StoreError,
    },
}

impl EtlError {
    pub fn source_unavailable(locator: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transformation(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transformation {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Whether a failed load may have left its table emptied or half written
    pub fn is_partial_write(&self) -> bool {
        matches!(self, Self::LoadFailed { partial: true, .. })
    }
}

fn partial_note(partial: &bool) -> &'static str {
    if *partial {
        "; the table may be left empty or partially populated"
    } else {
        ""
    }
}

fn failure_count(report: &crate::etl::RunReport) -> String {
    match report.failures.len() {
        1 => "1 entity".to_string(),
        n => format!("{} entities", n),
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// Pipeline stage an entity failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Stage::Resolve => "resolve",
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        };
        f.write_str(stage)
    }
}

/// One entity's failure, tagged with the stage it failed in
#[derive(Debug, thiserror::Error)]
#[error("Entity '{entity}' failed at {stage}: {error}")]
pub struct EntityFailure {
    pub entity: String,
    pub stage: Stage,
    #[source]
    pub error: EtlError,
}

impl EntityFailure {
    pub fn new(entity: impl Into<String>, stage: Stage, error: EtlError) -> Self {
        Self {
            entity: entity.into(),
            stage,
            error,
        }
    }

    /// Resolve-stage failure for a name with no registered rule
    pub fn unknown_entity(entity: &str) -> Self {
        Self::new(
            entity,
            Stage::Resolve,
            EtlError::UnknownEntity {
                entity: entity.to_string(),
            },
        )
    }
}

/// Outcome of a run that did not fully succeed
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Fail-fast: the run stopped at the first failure
    #[error("Pipeline aborted: {0}")]
    Aborted(EntityFailure),

    /// Continue: every entity was attempted, some failed
    #[error("Pipeline finished with {} failed", failure_count(.0))]
    Incomplete(crate::etl::RunReport),
}
