//! Work list management
//!
//! The work list is a YAML file naming the entities to load, in order, with
//! the CSV snapshot for each and optional cleaning parameters.
//!
//! Example format:
//! ```yaml
//! database: mydata.db
//! delimiter: ","
//! entities:
//!   - name: contacts
//!     path: data/contacts-20230414T185305.csv
//!     transform:
//!       duplicates_subset: [type, company, firstName]
//!       fill_value: Unknown
//!       filter_column: isActive
//!   - name: products
//!     path: data/products-20230414T185305.csv
//! ```

use crate::store::STAGING_PREFIX;
use crate::transform::{CleaningRule, RuleConfig, TransformRegistry};
use eyre::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENTITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid entity name pattern"));

/// One entity to process: its name doubles as the target table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub name: String,
    pub locator: String,
}

impl WorkItem {
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
        }
    }
}

/// Entity entry in the work list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityEntry {
    /// Entity and table name
    pub name: String,
    /// CSV snapshot, relative to the work list's directory unless absolute
    pub path: String,
    /// Cleaning parameters; required for names without a built-in rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<RuleConfig>,
}

/// Work list structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkList {
    /// Database file to load into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Field delimiter shared by every snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    /// Entities in processing order
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl WorkList {
    /// Read and validate a work list from a YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read work list: {}", path.display()))?;

        let mut list = Self::from_yaml(&content)
            .with_context(|| format!("Invalid work list: {}", path.display()))?;
        list.base_dir = path.parent().map(Path::to_path_buf);

        log::debug!(
            "Work list {} loaded: {} entities",
            path.display(),
            list.entities.len()
        );
        Ok(list)
    }

    /// Parse and validate a work list from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let list: Self =
            serde_yaml::from_str(content).with_context(|| "Failed to parse work list YAML")?;
        list.validate()?;
        Ok(list)
    }

    /// Check entity names and the delimiter
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.entities {
            if !ENTITY_NAME.is_match(&entry.name) {
                bail!(
                    "Entity name '{}' is not a plain identifier (letters, digits, underscore)",
                    entry.name
                );
            }
            if entry.name.starts_with(STAGING_PREFIX) {
                bail!(
                    "Entity name '{}' uses the reserved prefix '{}'",
                    entry.name,
                    STAGING_PREFIX
                );
            }
            if !seen.insert(entry.name.to_lowercase()) {
                bail!("Entity '{}' is listed more than once", entry.name);
            }
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// Delimiter as a single byte, defaulting to a comma
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter {
            None => Ok(b','),
            Some(c) if c.is_ascii() => Ok(c as u8),
            Some(c) => bail!("Delimiter '{}' is not a single ASCII character", c),
        }
    }

    /// Number of entities in the work list
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Entity names in processing order
    pub fn names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Work items with locators resolved against the work list's directory
    pub fn items(&self) -> Vec<WorkItem> {
        self.entities
            .iter()
            .map(|entry| WorkItem::new(&entry.name, self.resolve_path(&entry.path)))
            .collect()
    }

    fn resolve_path(&self, path: &str) -> String {
        match &self.base_dir {
            Some(base) if Path::new(path).is_relative() => {
                base.join(path).to_string_lossy().into_owned()
            }
            _ => path.to_string(),
        }
    }

    /// Built-in rules plus one rule per entity with a `transform` block
    pub fn registry(&self) -> TransformRegistry {
        let mut registry = TransformRegistry::builtin();
        for entry in &self.entities {
            if let Some(config) = &entry.transform {
                registry.register(&entry.name, CleaningRule::from_config(&entry.name, config));
            }
        }
        registry
    }
}
