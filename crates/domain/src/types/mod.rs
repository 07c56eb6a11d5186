//! Domain types and models

pub mod document;
pub mod user;

pub use document::{DocumentFields, FieldValue, UserDocument};
pub use user::{UserProfileEvent, UserRecord};
