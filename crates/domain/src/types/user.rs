//! Identity-provider user types
//!
//! Snapshots of a user record as emitted by the identity provider whenever
//! any attribute of the record changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ProfileSyncError, Result};

/// User record snapshot from the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl UserRecord {
    /// Create a bare record with only a `uid`.
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), ..Self::default() }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A "user record updated" event: the record before and after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileEvent {
    /// Delivery identifier assigned by the emitting platform, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// When the identity provider observed the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub before: UserRecord,
    pub after: UserRecord,
}

impl UserProfileEvent {
    pub fn new(before: UserRecord, after: UserRecord) -> Self {
        Self { event_id: None, timestamp: None, before, after }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// The user this event concerns. Taken from the `after` snapshot.
    pub fn uid(&self) -> &str {
        &self.after.uid
    }

    /// Whether `displayName` differs between the two snapshots.
    ///
    /// Two absent names compare equal.
    pub fn display_name_changed(&self) -> bool {
        self.before.display_name != self.after.display_name
    }

    /// Reject events that cannot identify a single user.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::InvalidInput` when the `uid` is empty or
    /// differs between the snapshots.
    pub fn validate(&self) -> Result<()> {
        if self.after.uid.trim().is_empty() {
            return Err(ProfileSyncError::InvalidInput("event has an empty uid".into()));
        }
        if self.before.uid != self.after.uid {
            return Err(ProfileSyncError::InvalidInput(format!(
                "uid changed between snapshots: {} -> {}",
                self.before.uid, self.after.uid
            )));
        }
        Ok(())
    }
}
