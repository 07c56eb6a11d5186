//! Configuration structures
//!
//! Loading lives in `profilesync-infra::config`; this module only defines
//! the shape, the defaults and validation.

use serde::{Deserialize, Serialize};

use crate::constants::USERS_COLLECTION;
use crate::errors::{ProfileSyncError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.sync.collection.trim().is_empty() {
            return Err(ProfileSyncError::Config("sync.collection must not be empty".into()));
        }
        if self.store.pool_size == 0 {
            return Err(ProfileSyncError::Config("store.pool_size must be at least 1".into()));
        }
        if self.runtime.max_instances == 0 {
            return Err(ProfileSyncError::Config(
                "runtime.max_instances must be at least 1".into(),
            ));
        }
        if self.runtime.max_delivery_attempts == 0 {
            return Err(ProfileSyncError::Config(
                "runtime.max_delivery_attempts must be at least 1".into(),
            ));
        }
        match self.store.backend {
            StoreBackend::Sqlite if self.store.sqlite_path.is_none() => Err(
                ProfileSyncError::Config("store.sqlite_path is required for sqlite backend".into()),
            ),
            StoreBackend::Http if self.store.base_url.is_none() => Err(ProfileSyncError::Config(
                "store.base_url is required for http backend".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Which document store adapter to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
    Http,
}

impl std::str::FromStr for StoreBackend {
    type Err = ProfileSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "http" => Ok(Self::Http),
            other => Err(ProfileSyncError::Config(format!("unknown store backend: {other}"))),
        }
    }
}

/// Document store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub sqlite_path: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Transport-level attempts per store call. The sync handler itself
    /// never retries.
    #[serde(default = "default_store_attempts")]
    pub max_attempts: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: None,
            pool_size: default_pool_size(),
            base_url: None,
            api_token: None,
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_store_attempts(),
        }
    }
}

/// What the handler does with a failed reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and report success to the caller.
    #[default]
    FailOpen,
    /// Log the failure and return it so the caller can redeliver.
    Propagate,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ProfileSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" => Ok(Self::FailOpen),
            "propagate" => Ok(Self::Propagate),
            other => Err(ProfileSyncError::Config(format!("unknown failure policy: {other}"))),
        }
    }
}

/// Handler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { collection: default_collection(), failure_policy: FailurePolicy::default() }
    }
}

/// Trigger runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Upper bound on concurrently running handler invocations.
    #[serde(default = "default_max_instances")]
    pub max_instances: usize,
    /// Deliveries per event when failures are propagated.
    #[serde(default = "default_delivery_attempts")]
    pub max_delivery_attempts: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_instances: default_max_instances(),
            max_delivery_attempts: default_delivery_attempts(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_store_attempts() -> usize {
    1
}

fn default_collection() -> String {
    USERS_COLLECTION.to_string()
}

fn default_max_instances() -> usize {
    10
}

fn default_delivery_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.collection, "users");
        assert_eq!(config.sync.failure_policy, FailurePolicy::FailOpen);
        assert_eq!(config.runtime.max_instances, 10);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn sqlite_backend_requires_path() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Sqlite;
        assert!(matches!(config.validate(), Err(ProfileSyncError::Config(_))));

        config.store.sqlite_path = Some("/tmp/docs.db".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn http_backend_requires_base_url() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Http;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_instances_rejected() {
        let mut config = Config::default();
        config.runtime.max_instances = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("fail-open".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailOpen);
        assert_eq!("PROPAGATE".parse::<FailurePolicy>().unwrap(), FailurePolicy::Propagate);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
