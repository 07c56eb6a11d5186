//! # ProfileSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The `DocumentStore` port (trait) that store adapters implement
//! - `ProfileSyncHandler`, the reaction to identity-provider profile updates
//! - Outcome and failure types reported by the handler
//!
//! ## Architecture Principles
//! - Only depends on `profilesync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

pub use sync::ports::DocumentStore;
pub use sync::{ProfileSyncHandler, SyncFailure, SyncOutcome, SyncStage};
