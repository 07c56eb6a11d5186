//! In-memory document store mock
//!
//! Records every call, resolves server timestamps against a manually
//! advanced clock and can be told to fail `get` or `set`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use profilesync_core::DocumentStore;
use profilesync_domain::{DocumentFields, ProfileSyncError, Result as DomainResult, UserDocument};
use serde_json::{Map, Value};

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get { collection: String, key: String },
    Set { collection: String, key: String, fields: DocumentFields },
}

type Key = (String, String);

pub struct RecordingStore {
    documents: Mutex<HashMap<Key, Map<String, Value>>>,
    calls: Mutex<Vec<StoreCall>>,
    now: Mutex<DateTime<Utc>>,
    fail_get: Mutex<Option<ProfileSyncError>>,
    fail_set: Mutex<Option<ProfileSyncError>>,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            now: Mutex::new(Self::epoch()),
            fail_get: Mutex::new(None),
            fail_set: Mutex::new(None),
        }
    }
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock value a fresh store starts at.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    /// Seed a raw document.
    pub fn with_document(self, collection: &str, key: &str, body: Value) -> Self {
        let body = body.as_object().cloned().expect("document body must be an object");
        self.documents.lock().insert((collection.to_string(), key.to_string()), body);
        self
    }

    pub fn fail_get_with(&self, err: ProfileSyncError) {
        *self.fail_get.lock() = Some(err);
    }

    pub fn fail_set_with(&self, err: ProfileSyncError) {
        *self.fail_set.lock() = Some(err);
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock();
        *now += Duration::seconds(seconds);
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    pub fn raw(&self, collection: &str, key: &str) -> Option<Map<String, Value>> {
        self.documents.lock().get(&(collection.to_string(), key.to_string())).cloned()
    }

    pub fn document(&self, collection: &str, key: &str) -> Option<UserDocument> {
        self.raw(collection, key).map(UserDocument::from_json)
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn set_calls(&self) -> usize {
        self.calls.lock().iter().filter(|call| matches!(call, StoreCall::Set { .. })).count()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, collection: &str, key: &str) -> DomainResult<Option<UserDocument>> {
        self.calls
            .lock()
            .push(StoreCall::Get { collection: collection.to_string(), key: key.to_string() });

        if let Some(err) = self.fail_get.lock().clone() {
            return Err(err);
        }

        Ok(self.raw(collection, key).map(UserDocument::from_json))
    }

    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> DomainResult<()> {
        self.calls.lock().push(StoreCall::Set {
            collection: collection.to_string(),
            key: key.to_string(),
            fields: fields.clone(),
        });

        if let Some(err) = self.fail_set.lock().clone() {
            return Err(err);
        }

        let now = self.now();
        let mut documents = self.documents.lock();
        let body = documents.entry((collection.to_string(), key.to_string())).or_default();
        fields.apply_to(body, now);
        Ok(())
    }
}
