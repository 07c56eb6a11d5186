//! Document-store types
//!
//! Documents are schema-flexible JSON objects. The sync handler owns four
//! fields of a user document; every other field belongs to someone else and
//! must survive a write untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::fields;

/// User document keyed by `uid` in the users collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields owned by other collaborators, plus owned fields whose stored
    /// shape was not recognised.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserDocument {
    /// Decode a raw stored document.
    ///
    /// Never fails: an owned field holding something other than the expected
    /// string or RFC 3339 timestamp (another writer's timestamp object, epoch
    /// millis) is left untouched in `extra` and reads as `None`.
    pub fn from_json(mut body: Map<String, Value>) -> Self {
        let display_name = take_owned(&mut body, fields::DISPLAY_NAME, decode_string);
        let email = take_owned(&mut body, fields::EMAIL, decode_string);
        let created_at = take_owned(&mut body, fields::CREATED_AT, decode_timestamp);
        let updated_at = take_owned(&mut body, fields::UPDATED_AT, decode_timestamp);
        Self { display_name, email, created_at, updated_at, extra: body }
    }
}

/// Remove `name` from `body` if it is null or decodes; otherwise leave it.
fn take_owned<T>(
    body: &mut Map<String, Value>,
    name: &str,
    decode: fn(&Value) -> Option<T>,
) -> Option<T> {
    let decoded = match body.get(name)? {
        Value::Null => None,
        value => Some(decode(value)?),
    };
    body.remove(name);
    decoded
}

fn decode_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.as_str()?).ok().map(|ts| ts.with_timezone(&Utc))
}

/// Value written to a single named field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Concrete JSON value supplied by the writer.
    Value(Value),
    /// Resolved by the store to its own clock when the write commits.
    ServerTimestamp,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Named-field write set for `DocumentStore::set`.
///
/// Only the named fields are created or overwritten; a store must leave
/// every other field of the target document as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFields {
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a concrete value. `None` is written as JSON `null`.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), FieldValue::Value(value.into()));
        self
    }

    /// Ask the store to stamp `name` with its commit time.
    pub fn server_timestamp(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::ServerTimestamp);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields carrying concrete values, as a JSON object.
    pub fn concrete_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|(name, value)| match value {
                FieldValue::Value(v) => Some((name.clone(), v.clone())),
                FieldValue::ServerTimestamp => None,
            })
            .collect()
    }

    /// Names of fields the store must stamp.
    pub fn server_timestamp_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, value)| matches!(value, FieldValue::ServerTimestamp))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Resolve every sentinel to `now`. All timestamps of one write share
    /// the same instant.
    pub fn resolve(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        self.fields
            .iter()
            .map(|(name, value)| {
                let resolved = match value {
                    FieldValue::Value(v) => v.clone(),
                    FieldValue::ServerTimestamp => stamp.clone(),
                };
                (name.clone(), resolved)
            })
            .collect()
    }

    /// Merge the resolved fields into `target`, leaving other keys alone.
    pub fn apply_to(&self, target: &mut Map<String, Value>, now: DateTime<Utc>) {
        for (name, value) in self.resolve(now) {
            target.insert(name, value);
        }
    }
}
