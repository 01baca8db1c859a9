//! Configuration loading and representation.
//!
//! Everything comes from environment variables; unset variables fall back to
//! defaults suitable for a throwaway console session.

use thiserror::Error;

pub const DATABASE_URL_VAR: &str = "STOCKROOM_DATABASE_URL";
pub const CLEAR_ON_START_VAR: &str = "STOCKROOM_CLEAR_ON_START";

/// In-memory SQLite: the catalog lives exactly as long as the process.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} (expected true/false/1/0)")]
    InvalidBool { var: &'static str, value: String },
}

/// Catalog connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub database_url: String,
    /// Wipe both collections when the gateway opens.
    pub clear_on_start: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            clear_on_start: true,
        }
    }
}

impl CatalogConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup` (variable name → value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = lookup(DATABASE_URL_VAR).unwrap_or_else(|| {
            tracing::info!(
                "{DATABASE_URL_VAR} not set; using {}",
                defaults.database_url
            );
            defaults.database_url.clone()
        });

        let clear_on_start = match lookup(CLEAR_ON_START_VAR) {
            Some(value) => parse_bool(CLEAR_ON_START_VAR, &value)?,
            None => defaults.clear_on_start,
        };

        if !clear_on_start && database_url == DEFAULT_DATABASE_URL {
            tracing::warn!(
                "{CLEAR_ON_START_VAR}=false has no effect on an in-memory database"
            );
        }

        Ok(Self {
            database_url,
            clear_on_start,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<CatalogConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CatalogConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]).unwrap(), CatalogConfig::default());
    }

    #[test]
    fn reads_database_url_and_clear_flag() {
        let config = config_from(&[
            (DATABASE_URL_VAR, "sqlite://catalog.db"),
            (CLEAR_ON_START_VAR, "false"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite://catalog.db");
        assert!(!config.clear_on_start);
    }

    #[test]
    fn clear_flag_accepts_digits_and_case() {
        assert!(config_from(&[(CLEAR_ON_START_VAR, "1")]).unwrap().clear_on_start);
        assert!(!config_from(&[(CLEAR_ON_START_VAR, "FALSE")]).unwrap().clear_on_start);
    }

    #[test]
    fn invalid_clear_flag_is_an_error() {
        let err = config_from(&[(CLEAR_ON_START_VAR, "sometimes")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBool {
                var: CLEAR_ON_START_VAR,
                value: "sometimes".to_string(),
            }
        );
    }
}
