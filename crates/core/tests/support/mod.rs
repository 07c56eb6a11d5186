//! Shared test helpers for `profilesync-core` integration tests.
//!
//! These helpers provide an inspectable document store and log capture so
//! handler tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod logs;
pub mod store;

use profilesync_domain::{UserProfileEvent, UserRecord};

/// Event that renames `uid` from `from` to `to`.
pub fn rename_event(uid: &str, from: Option<&str>, to: Option<&str>) -> UserProfileEvent {
    let mut before = UserRecord::new(uid);
    before.display_name = from.map(str::to_string);
    let mut after = UserRecord::new(uid).with_email(format!("{uid}@example.com"));
    after.display_name = to.map(str::to_string);
    UserProfileEvent::new(before, after)
}
