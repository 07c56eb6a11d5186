//! Shared helpers for `profilesync-functions` integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use profilesync_core::DocumentStore;
use profilesync_domain::{
    DocumentFields, ProfileSyncError, Result as DomainResult, UserDocument, UserProfileEvent,
    UserRecord,
};
use profilesync_infra::InMemoryDocumentStore;

/// Event that renames `uid` from `from` to `to`.
pub fn rename_event(uid: &str, from: &str, to: &str) -> UserProfileEvent {
    UserProfileEvent::new(
        UserRecord::new(uid).with_display_name(from),
        UserRecord::new(uid).with_display_name(to).with_email(format!("{uid}@example.com")),
    )
    .with_event_id(format!("evt-{uid}"))
}

/// Wraps an in-memory store: fails the first `failures` lookups and tracks
/// how many calls are in flight at once.
pub struct FlakyStore {
    inner: InMemoryDocumentStore,
    failures: AtomicUsize,
    error: ProfileSyncError,
    latency: Duration,
    gets: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            failures: AtomicUsize::new(0),
            error: ProfileSyncError::Unavailable("backend restarting".into()),
            latency: Duration::ZERO,
            gets: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, failures: usize, error: ProfileSyncError) -> Self {
        self.failures = AtomicUsize::new(failures);
        self.error = error;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, key: &str) -> DomainResult<Option<UserDocument>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Err(self.error.clone())
        } else {
            self.inner.get(collection, key).await
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> DomainResult<()> {
        self.inner.set(collection, key, fields).await
    }
}
