//! Document store adapters
//!
//! Implementations of `profilesync_core::DocumentStore`. All adapters merge
//! the named fields of a write into the stored document and resolve
//! server-timestamp sentinels at commit time.

pub mod clock;
pub mod http;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use profilesync_core::DocumentStore;
use profilesync_domain::{Result, StoreBackend, StoreConfig};
use tracing::info;

pub use clock::{Clock, ManualClock, SystemClock};
pub use http::HttpDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Build the adapter selected by `config.backend`.
///
/// # Errors
/// Returns `ProfileSyncError::Config` when the backend's required settings
/// are missing, or the adapter's own error when it cannot be opened.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::from_config(config)?),
        StoreBackend::Http => Arc::new(HttpDocumentStore::from_config(config)?),
    };
    info!(backend = ?config.backend, "document store connected");
    Ok(store)
}
