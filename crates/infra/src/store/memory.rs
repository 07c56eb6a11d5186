//! In-process document store
//!
//! Holds raw JSON documents in a `DashMap`. Each `set` merges under the
//! entry's shard lock, so concurrent writes to one key never interleave
//! within a single write.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use profilesync_core::DocumentStore;
use profilesync_domain::{DocumentFields, Result, UserDocument};
use serde_json::{Map, Value};
use tracing::debug;

use super::clock::{Clock, SystemClock};

type DocumentKey = (String, String);

/// `DashMap`-backed implementation of `DocumentStore`
pub struct InMemoryDocumentStore {
    documents: DashMap<DocumentKey, Map<String, Value>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { documents: DashMap::new(), clock }
    }

    /// Store a raw document, replacing any existing one.
    pub fn insert_raw(&self, collection: &str, key: &str, body: Map<String, Value>) {
        self.documents.insert(document_key(collection, key), body);
    }

    /// Copy of the raw stored document.
    pub fn raw(&self, collection: &str, key: &str) -> Option<Map<String, Value>> {
        self.documents.get(&document_key(collection, key)).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<UserDocument>> {
        Ok(self.raw(collection, key).map(UserDocument::from_json))
    }

    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> Result<()> {
        let now = self.clock.now();
        let mut entry = self.documents.entry(document_key(collection, key)).or_default();
        fields.apply_to(entry.value_mut(), now);
        debug!(collection, key, fields = fields.len(), "document written");
        Ok(())
    }
}

fn document_key(collection: &str, key: &str) -> DocumentKey {
    (collection.to_string(), key.to_string())
}
