//! Event intake
//!
//! Events arrive as newline-delimited JSON, one `UserProfileEvent` per line.
//! Blank lines are skipped.

use std::io::BufRead;

use profilesync_domain::{ProfileSyncError, Result, UserProfileEvent};

/// Read every event from `reader`.
///
/// # Errors
/// Returns `ProfileSyncError::InvalidInput` naming the 1-based line number
/// of the first line that is not a valid event.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<UserProfileEvent>> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| {
            ProfileSyncError::InvalidInput(format!("line {line_no}: failed to read: {e}"))
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let event = serde_json::from_str::<UserProfileEvent>(&line)
            .map_err(|e| ProfileSyncError::InvalidInput(format!("line {line_no}: {e}")))?;
        events.push(event);
    }

    Ok(events)
}
