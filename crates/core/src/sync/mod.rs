//! Profile synchronization: identity provider → document store

pub mod handler;
pub mod outcome;
pub mod ports;

pub use handler::ProfileSyncHandler;
pub use outcome::{SyncFailure, SyncOutcome, SyncStage};
