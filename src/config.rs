//! Run settings from the environment
//!
//! Expected environment variables (a dotenv file is sourced first by the CLI):
//! - DUCKLOAD_DATABASE: database file to load into (optional)
//! - DUCKLOAD_ERROR_POLICY: `fail-fast` or `continue` (optional)
//!
//! Precedence for each setting is CLI flag, then environment, then work list,
//! then the built-in default.

use crate::etl::ErrorPolicy;
use eyre::{Result, eyre};

pub const DATABASE_VAR: &str = "DUCKLOAD_DATABASE";
pub const ERROR_POLICY_VAR: &str = "DUCKLOAD_ERROR_POLICY";

/// Database used when nothing else names one
pub const DEFAULT_DATABASE: &str = "mydata.db";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub database: Option<String>,
    pub error_policy: Option<ErrorPolicy>,
}

impl Settings {
    /// Read settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database = std::env::var(DATABASE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let error_policy = match std::env::var(ERROR_POLICY_VAR) {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .parse::<ErrorPolicy>()
                    .map_err(|e| eyre!("Invalid {}: {}", ERROR_POLICY_VAR, e))?,
            ),
            _ => None,
        };

        Ok(Self {
            database,
            error_policy,
        })
    }

    /// Pick the database location: flag, environment, work list, default
    pub fn database(&self, flag: Option<&str>, work_list: Option<&str>) -> String {
        flag.or(self.database.as_deref())
            .or(work_list)
            .unwrap_or(DEFAULT_DATABASE)
            .to_string()
    }

    /// `--keep-going` forces `Continue`; otherwise the environment decides
    pub fn error_policy(&self, keep_going: bool) -> ErrorPolicy {
        if keep_going {
            ErrorPolicy::Continue
        } else {
            self.error_policy.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var(DATABASE_VAR);
            std::env::remove_var(ERROR_POLICY_VAR);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database(None, None), "mydata.db");
        assert_eq!(settings.error_policy(false), ErrorPolicy::FailFast);
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        clear_env();
        unsafe {
            std::env::set_var(DATABASE_VAR, "/tmp/warehouse.db");
            std::env::set_var(ERROR_POLICY_VAR, "continue");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.database(None, Some("worklist.db")), "/tmp/warehouse.db");
        assert_eq!(settings.database(Some("cli.db"), Some("worklist.db")), "cli.db");
        assert_eq!(settings.error_policy(false), ErrorPolicy::Continue);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_policy() {
        clear_env();
        unsafe {
            std::env::set_var(ERROR_POLICY_VAR, "sometimes");
        }

        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains(ERROR_POLICY_VAR));

        clear_env();
    }

    #[test]
    fn test_precedence_without_env() {
        let settings = Settings::default();
        assert_eq!(settings.database(None, Some("worklist.db")), "worklist.db");
        assert_eq!(settings.error_policy(true), ErrorPolicy::Continue);
    }
}
