//! Logging initialisation
//!
//! Logs go to stderr so stdout stays free for command output. `RUST_LOG`
//! overrides the configured level when set.

use profilesync_domain::{LoggingConfig, ProfileSyncError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns `ProfileSyncError::Config` for an unparsable level and
/// `ProfileSyncError::Internal` when a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| ProfileSyncError::Internal(format!("failed to install logger: {e}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        ProfileSyncError::Config(format!("invalid logging.level '{}': {e}", config.level))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_parses() {
        let config = LoggingConfig { level: "profilesync_core=debug,warn".into(), json: false };
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn garbage_level_is_config_error() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { level: "=[".into(), json: true };
        assert!(matches!(build_filter(&config), Err(ProfileSyncError::Config(_))));
    }
}
