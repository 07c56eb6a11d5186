//! Application context - dependency injection container
//!
//! Built once per process from the loaded configuration and shared by every
//! invocation. The document store client is the only expensive resource.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use profilesync_core::{DocumentStore, ProfileSyncHandler};
use profilesync_domain::{Config, Result};
use tracing::{info, warn};

use crate::runtime::TriggerRuntime;

static CONTEXT: OnceCell<Arc<AppContext>> = OnceCell::new();

/// Application context - holds the store client and the sync handler
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub handler: Arc<ProfileSyncHandler>,
}

impl AppContext {
    /// Build a context without registering it process-wide.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` for invalid configuration and
    /// store errors when the backend cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let store = profilesync_infra::connect(&config.store)?;
        let handler = Arc::new(ProfileSyncHandler::from_config(Arc::clone(&store), &config.sync));

        info!(
            backend = ?config.store.backend,
            collection = %config.sync.collection,
            policy = ?config.sync.failure_policy,
            "application context ready"
        );

        Ok(Self { config, store, handler })
    }

    /// Initialise the process-wide context, or return the existing one.
    ///
    /// Only the first successful call builds anything; later calls ignore
    /// their `config`.
    pub fn init(config: Config) -> Result<Arc<Self>> {
        if let Some(existing) = CONTEXT.get() {
            warn!("application context already initialised; ignoring new configuration");
            return Ok(Arc::clone(existing));
        }
        CONTEXT.get_or_try_init(|| Self::new(config).map(Arc::new)).cloned()
    }

    /// The process-wide context, if [`AppContext::init`] has succeeded.
    pub fn get() -> Option<Arc<Self>> {
        CONTEXT.get().cloned()
    }

    /// Runtime delivering events to this context's handler.
    pub fn runtime(&self) -> TriggerRuntime {
        TriggerRuntime::new(Arc::clone(&self.handler), &self.config.runtime)
    }
}

#[cfg(test)]
mod tests {
    use profilesync_domain::{FailurePolicy, ProfileSyncError, StoreBackend};

    use super::*;

    #[test]
    fn new_wires_handler_from_sync_config() {
        let mut config = Config::default();
        config.sync.collection = "profiles".into();
        config.sync.failure_policy = FailurePolicy::Propagate;

        let ctx = AppContext::new(config).unwrap();
        assert_eq!(ctx.handler.collection(), "profiles");
        assert_eq!(ctx.handler.failure_policy(), FailurePolicy::Propagate);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Sqlite;

        assert!(matches!(AppContext::new(config), Err(ProfileSyncError::Config(_))));
    }

    #[test]
    fn init_is_idempotent() {
        let first = AppContext::init(Config::default()).unwrap();

        let mut other = Config::default();
        other.sync.collection = "elsewhere".into();
        let second = AppContext::init(other).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.handler.collection(), "users");
        assert!(AppContext::get().is_some());
    }
}
