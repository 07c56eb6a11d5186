//! Results reported by the sync handler

use std::fmt;

use profilesync_domain::ProfileSyncError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a single handler invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Display name unchanged; the store was not touched.
    Unchanged,
    /// Existing document received the new display name.
    Updated,
    /// Document did not exist and was created.
    Created,
    /// Reconciliation failed and the failure was swallowed (fail-open).
    Abandoned,
}

impl SyncOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Updated => "updated",
            Self::Created => "created",
            Self::Abandoned => "abandoned",
        }
    }

    /// Whether the store was written to.
    pub fn wrote(self) -> bool {
        matches!(self, Self::Updated | Self::Created)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of the reconciliation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Validate,
    Lookup,
    Write,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validate",
            Self::Lookup => "lookup",
            Self::Write => "write",
        })
    }
}

/// A reconciliation that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed for uid {uid}: {source}")]
pub struct SyncFailure {
    pub uid: String,
    pub stage: SyncStage,
    #[source]
    pub source: ProfileSyncError,
}

impl SyncFailure {
    pub fn new(uid: impl Into<String>, stage: SyncStage, source: ProfileSyncError) -> Self {
        Self { uid: uid.into(), stage, source }
    }

    /// Whether redelivering the event could succeed.
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_stage_and_uid() {
        let failure = SyncFailure::new(
            "u1",
            SyncStage::Write,
            ProfileSyncError::Unavailable("connection refused".into()),
        );
        assert_eq!(
            failure.to_string(),
            "write failed for uid u1: Document store unavailable: connection refused"
        );
        assert!(failure.is_transient());
    }

    #[test]
    fn only_updates_and_creates_write() {
        assert!(SyncOutcome::Updated.wrote());
        assert!(SyncOutcome::Created.wrote());
        assert!(!SyncOutcome::Unchanged.wrote());
        assert!(!SyncOutcome::Abandoned.wrote());
    }
}
