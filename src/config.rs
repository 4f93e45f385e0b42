//! Engine configuration
//!
//! All fields are optional in the JSON form and fall back to defaults:
//! - default_page_size: 100 (page size used when a find call names none)
//! - log_level: "warn" (minimum severity written to stderr)

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::observability::{Logger, Severity};

/// Default page size for unpaged find calls
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default minimum log severity
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size for find calls without an explicit page request
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Minimum log severity: trace, debug, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Sets the default page size
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Checks field ranges
    pub fn validate(&self) -> QueryResult<()> {
        if self.default_page_size == 0 {
            return Err(QueryError::InvalidPageSize(0));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> QueryResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            QueryError::invalid_argument("log_level", format!("unknown level '{}'", self.log_level))
        })
    }

    /// Installs `log_level` as the process-wide minimum severity
    pub fn apply_logging(&self) -> QueryResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = EngineConfig::default().with_default_page_size(0);
        assert_eq!(config.validate(), Err(QueryError::InvalidPageSize(0)));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let config: EngineConfig = serde_json::from_str(r#"{"log_level": "loud"}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "DOCREPO_INVALID_ARGUMENT");
    }

    #[test]
    fn test_severity_parsed() {
        let config: EngineConfig = serde_json::from_str(r#"{"log_level": "info"}"#).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }
}
