//! # ProfileSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Document store adapters (in-memory, SQLite, HTTP)
//! - HTTP client with bounded retries
//! - Configuration loading
//! - Conversions from third-party errors into domain errors
//!
//! ## Architecture
//! - Implements traits defined in `profilesync-core`
//! - Contains all "impure" code (I/O, clocks, network)

pub mod config;
pub mod errors;
pub mod http;
pub mod store;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use store::{
    connect, Clock, HttpDocumentStore, InMemoryDocumentStore, ManualClock, SqliteDocumentStore,
    SystemClock,
};
