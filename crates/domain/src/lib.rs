//! # ProfileSync Domain
//!
//! Business domain types for profile synchronization.
//!
//! This crate contains:
//! - Identity-provider event types (`UserRecord`, `UserProfileEvent`)
//! - Document-store types (`UserDocument`, `DocumentFields`, `FieldValue`)
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other ProfileSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
