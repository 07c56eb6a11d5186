//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `PROFILESYNC_STORE_BACKEND` is set, configuration is read from the
//!    environment (every other variable is optional and falls back to its
//!    default)
//! 2. Otherwise a config file is loaded, probing multiple paths
//! 3. With no file either, built-in defaults are used
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PROFILESYNC_STORE_BACKEND`: `memory`, `sqlite` or `http`
//! - `PROFILESYNC_SQLITE_PATH`: SQLite database file
//! - `PROFILESYNC_POOL_SIZE`: SQLite connection pool size
//! - `PROFILESYNC_STORE_URL`: Base URL of the document service
//! - `PROFILESYNC_STORE_TOKEN`: Bearer token for the document service
//! - `PROFILESYNC_STORE_TIMEOUT`: Request timeout in seconds
//! - `PROFILESYNC_STORE_MAX_ATTEMPTS`: Transport attempts per store call
//! - `PROFILESYNC_COLLECTION`: Target collection name
//! - `PROFILESYNC_FAILURE_POLICY`: `fail_open` or `propagate`
//! - `PROFILESYNC_MAX_INSTANCES`: Concurrent handler invocations
//! - `PROFILESYNC_MAX_DELIVERY_ATTEMPTS`: Deliveries per event
//! - `PROFILESYNC_LOG_LEVEL`: Default log level
//! - `PROFILESYNC_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./profilesync.{json,toml}` or `./config.{json,toml}`
//! 2. The same names one and two directories up
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use profilesync_domain::{Config, ProfileSyncError, Result};

const FILE_NAMES: [&str; 4] = ["profilesync.json", "profilesync.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ProfileSyncError::Config` if a source is present but invalid,
/// or if the resulting configuration fails validation.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os("PROFILESYNC_STORE_BACKEND").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No configuration found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ProfileSyncError::Config` if `PROFILESYNC_STORE_BACKEND` is
/// missing or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.store.backend = env_var("PROFILESYNC_STORE_BACKEND")?.parse()?;
    config.store.sqlite_path = env_opt("PROFILESYNC_SQLITE_PATH");
    config.store.base_url = env_opt("PROFILESYNC_STORE_URL");
    config.store.api_token = env_opt("PROFILESYNC_STORE_TOKEN");
    if let Some(size) = env_parse::<u32>("PROFILESYNC_POOL_SIZE")? {
        config.store.pool_size = size;
    }
    if let Some(timeout) = env_parse::<u64>("PROFILESYNC_STORE_TIMEOUT")? {
        config.store.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("PROFILESYNC_STORE_MAX_ATTEMPTS")? {
        config.store.max_attempts = attempts;
    }

    if let Some(collection) = env_opt("PROFILESYNC_COLLECTION") {
        config.sync.collection = collection;
    }
    if let Some(policy) = env_opt("PROFILESYNC_FAILURE_POLICY") {
        config.sync.failure_policy = policy.parse()?;
    }

    if let Some(instances) = env_parse::<usize>("PROFILESYNC_MAX_INSTANCES")? {
        config.runtime.max_instances = instances;
    }
    if let Some(attempts) = env_parse::<u32>("PROFILESYNC_MAX_DELIVERY_ATTEMPTS")? {
        config.runtime.max_delivery_attempts = attempts;
    }

    if let Some(level) = env_opt("PROFILESYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("PROFILESYNC_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ProfileSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ProfileSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ProfileSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ProfileSyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ProfileSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ProfileSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ProfileSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ProfileSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Get optional, non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ProfileSyncError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
