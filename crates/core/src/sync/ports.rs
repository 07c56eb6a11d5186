//! Port interfaces for document persistence
//!
//! These traits define the boundary between the sync handler and the
//! keyed document store it reconciles.

use async_trait::async_trait;
use profilesync_domain::{DocumentFields, Result, UserDocument};

/// Keyed, schema-flexible document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored under `key`, or `None` if absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<UserDocument>>;

    /// Create the document or overwrite the named fields of an existing one.
    ///
    /// Fields not named in `fields` are left untouched. Server-timestamp
    /// sentinels are resolved to the store's clock at commit time.
    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> Result<()>;
}
