//! Profile sync handler - core business logic
//!
//! Reacts to a "user record updated" event from the identity provider and
//! reconciles the user's document in the document store. Only a
//! `displayName` change causes a write.

use std::sync::Arc;

use profilesync_domain::constants::{fields, USERS_COLLECTION};
use profilesync_domain::{DocumentFields, FailurePolicy, SyncConfig, UserProfileEvent, UserRecord};
use tracing::{error, info, instrument};

use super::outcome::{SyncFailure, SyncOutcome, SyncStage};
use super::ports::DocumentStore;

/// Profile synchronization handler
pub struct ProfileSyncHandler {
    store: Arc<dyn DocumentStore>,
    collection: String,
    policy: FailurePolicy,
}

impl ProfileSyncHandler {
    /// Create a fail-open handler writing to the `users` collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: USERS_COLLECTION.to_string(),
            policy: FailurePolicy::FailOpen,
        }
    }

    /// Create a handler from the `sync` section of the configuration.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &SyncConfig) -> Self {
        Self::new(store)
            .with_collection(config.collection.clone())
            .with_failure_policy(config.failure_policy)
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Trigger entry point: reconcile and apply the failure policy.
    ///
    /// Every failure is logged here. Under `FailOpen` it is then dropped and
    /// the invocation reports `SyncOutcome::Abandoned`; under `Propagate` it
    /// is returned so the caller can redeliver.
    #[instrument(skip(self, event), fields(uid = %event.uid()))]
    pub async fn handle(&self, event: &UserProfileEvent) -> Result<SyncOutcome, SyncFailure> {
        match self.reconcile(event).await {
            Ok(outcome) => Ok(outcome),
            Err(failure) => {
                error!(
                    uid = %failure.uid,
                    stage = %failure.stage,
                    error = %failure.source,
                    error_type = failure.source.label(),
                    policy = ?self.policy,
                    "failed to sync displayName"
                );
                match self.policy {
                    FailurePolicy::FailOpen => Ok(SyncOutcome::Abandoned),
                    FailurePolicy::Propagate => Err(failure),
                }
            }
        }
    }

    /// Reconcile the user document with the `after` snapshot.
    ///
    /// Does not log failures and does not apply the failure policy; use
    /// [`ProfileSyncHandler::handle`] from trigger code.
    ///
    /// # Errors
    /// Returns a [`SyncFailure`] naming the stage that failed.
    pub async fn reconcile(&self, event: &UserProfileEvent) -> Result<SyncOutcome, SyncFailure> {
        let uid = event.uid();
        event.validate().map_err(|err| SyncFailure::new(uid, SyncStage::Validate, err))?;

        if !event.display_name_changed() {
            info!(uid, "no displayName change");
            return Ok(SyncOutcome::Unchanged);
        }

        let existing = self
            .store
            .get(&self.collection, uid)
            .await
            .map_err(|err| SyncFailure::new(uid, SyncStage::Lookup, err))?;

        let (write, outcome) = match existing {
            Some(_) => (update_fields(&event.after), SyncOutcome::Updated),
            None => (create_fields(&event.after), SyncOutcome::Created),
        };

        self.store
            .set(&self.collection, uid, write)
            .await
            .map_err(|err| SyncFailure::new(uid, SyncStage::Write, err))?;

        info!(uid, outcome = outcome.as_str(), "synced displayName");
        Ok(outcome)
    }
}

/// Fields written to an existing document.
fn update_fields(after: &UserRecord) -> DocumentFields {
    DocumentFields::new()
        .set(fields::DISPLAY_NAME, after.display_name.clone())
        .server_timestamp(fields::UPDATED_AT)
}

/// Fields written when the document does not exist yet.
fn create_fields(after: &UserRecord) -> DocumentFields {
    DocumentFields::new()
        .set(fields::DISPLAY_NAME, after.display_name.clone())
        .set(fields::EMAIL, after.email.clone())
        .server_timestamp(fields::CREATED_AT)
        .server_timestamp(fields::UPDATED_AT)
}
