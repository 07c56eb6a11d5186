//! # ProfileSync Functions
//!
//! Hosting layer for the profile sync trigger.
//!
//! This crate contains:
//! - Process-wide context with an init-once lifecycle
//! - Logging initialisation
//! - Event intake (newline-delimited JSON)
//! - `TriggerRuntime`, which delivers events to the handler with bounded
//!   concurrency and redelivery of propagated failures

pub mod context;
pub mod events;
pub mod logging;
pub mod runtime;

pub use context::AppContext;
pub use events::read_events;
pub use runtime::{DeliveryReport, DispatchSummary, TriggerRuntime};
