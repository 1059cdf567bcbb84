//! Application configuration
//!
//! Read from `LOANAPP_*` environment variables, after an optional `.env`
//! file has been loaded. Every setting has a default, so an empty
//! environment yields a working configuration.

use serde::Deserialize;
use std::path::PathBuf;

use config::{Config, Environment};
use core_kernel::{CoreError, Currency};

use crate::documents::{DocumentPolicy, DEFAULT_MAX_DOCUMENT_BYTES};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LOANAPP";

/// Loan application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationConfig {
    /// Currency for displayed amounts
    pub currency: Currency,
    /// Upload size cap in bytes
    pub max_document_bytes: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory for file-backed drafts
    pub draft_dir: PathBuf,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            log_level: "info".to_string(),
            draft_dir: PathBuf::from(".loanapp/drafts"),
        }
    }
}

impl ApplicationConfig {
    /// Loads `.env` if present, then reads the environment
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Reads `LOANAPP_*` variables over the defaults
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Reads an explicit environment source over the defaults
    pub fn from_environment(environment: Environment) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let max_bytes = i64::try_from(defaults.max_document_bytes)
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        let config = Config::builder()
            .set_default("currency", defaults.currency.code())
            .and_then(|b| b.set_default("max_document_bytes", max_bytes))
            .and_then(|b| b.set_default("log_level", defaults.log_level.as_str()))
            .and_then(|b| b.set_default("draft_dir", defaults.draft_dir.to_string_lossy().as_ref()))
            .map_err(|e| CoreError::configuration(e.to_string()))?
            .add_source(environment.try_parsing(true))
            .build()
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.max_document_bytes == 0 {
            return Err(CoreError::configuration("max_document_bytes must be greater than zero"));
        }
        Ok(())
    }

    /// Upload checks derived from this configuration
    pub fn document_policy(&self) -> DocumentPolicy {
        DocumentPolicy::new(self.max_document_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = ApplicationConfig::from_environment(env(&[])).unwrap();
        assert_eq!(config, ApplicationConfig::default());
        assert_eq!(config.document_policy(), DocumentPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = ApplicationConfig::from_environment(env(&[
            ("LOANAPP_CURRENCY", "EUR"),
            ("LOANAPP_MAX_DOCUMENT_BYTES", "1048576"),
            ("LOANAPP_LOG_LEVEL", "debug"),
            ("LOANAPP_DRAFT_DIR", "/var/lib/loanapp"),
        ]))
        .unwrap();

        assert_eq!(config.currency, Currency::EUR);
        assert_eq!(config.document_policy().max_bytes, 1024 * 1024);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.draft_dir, PathBuf::from("/var/lib/loanapp"));
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let err = ApplicationConfig::from_environment(env(&[("LOANAPP_CURRENCY", "XYZ")])).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));

        let err = ApplicationConfig::from_environment(env(&[("LOANAPP_MAX_DOCUMENT_BYTES", "0")])).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
