// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backend entity model: ids, kinds, info records and discovery status.

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Marker rendered in place of a field the backend did not provide.
pub const NOT_FOUND: &str = "Not found";

/// Opaque identifier of a backend entity.
///
/// Ids are stable for the lifetime of an entity within one backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Sentinel for "no entity".
    pub const INVALID: EntityId = EntityId(u64::MAX);

    /// Wrap a raw backend value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw backend value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// `false` only for [`EntityId::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("invalid")
        }
    }
}

/// Kind of entity tracked by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Host,
    User,
    Process,
    Domain,
    Topic,
    Participant,
    DataReader,
    DataWriter,
    Locator,
}

impl EntityKind {
    /// Label used in report lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::User => "User",
            Self::Process => "Process",
            Self::Domain => "Domain",
            Self::Topic => "Topic",
            Self::Participant => "Participant",
            Self::DataReader => "DataReader",
            Self::DataWriter => "DataWriter",
            Self::Locator => "Locator",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure to read a field out of an [`EntityInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field '{0}' not present")]
    Missing(String),

    #[error("field '{field}' is not a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Schema-less description of one entity, as reported by the backend.
///
/// Every accessor returns a `Result`; no field is guaranteed to exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityInfo(Map<String, Value>);

impl EntityInfo {
    /// Empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a field (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw field value.
    pub fn get(&self, key: &str) -> Result<&Value, FieldError> {
        self.0
            .get(key)
            .ok_or_else(|| FieldError::Missing(key.to_string()))
    }

    /// String field.
    pub fn str_field(&self, key: &str) -> Result<&str, FieldError> {
        self.get(key)?.as_str().ok_or_else(|| FieldError::WrongType {
            field: key.to_string(),
            expected: "string",
        })
    }

    /// String field, or [`NOT_FOUND`] when missing or mistyped.
    pub fn str_or_not_found(&self, key: &str) -> String {
        match self.str_field(key) {
            Ok(value) => value.to_string(),
            Err(err) => {
                tracing::debug!("{}", err);
                NOT_FOUND.to_string()
            }
        }
    }

    pub fn name(&self) -> Result<&str, FieldError> {
        self.str_field("name")
    }

    pub fn guid(&self) -> Result<&str, FieldError> {
        self.str_field("guid")
    }

    /// Advertised locators, any JSON shape.
    pub fn locators(&self) -> Option<&Value> {
        self.0.get("locators")
    }
}

/// Pretty JSON (4-space indent) for a locator list, or [`NOT_FOUND`] when
/// absent.
pub fn render_locators(locators: Option<&Value>) -> String {
    match locators {
        Some(value) => to_pretty_json(value).unwrap_or_else(|err| {
            tracing::debug!("Locator rendering failed: {}", err);
            NOT_FOUND.to_string()
        }),
        None => NOT_FOUND.to_string(),
    }
}

fn to_pretty_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `serialize_with` helper: locators as reported, or [`NOT_FOUND`] when the
/// backend gave none.
pub(crate) fn serialize_locators<S>(
    locators: &Option<Value>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match locators {
        Some(value) => value.serialize(serializer),
        None => serializer.serialize_str(NOT_FOUND),
    }
}

/// Count-delta status delivered with every discovery callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStatus {
    /// Total cumulative count of entities seen.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// Current number of entities.
    pub current_count: u32,
    /// Change in current_count since last callback.
    pub current_count_change: i32,
}

impl DomainStatus {
    /// Status with only the current count delta set.
    pub fn with_change(current_count_change: i32) -> Self {
        Self {
            current_count_change,
            ..Default::default()
        }
    }

    /// Classify the event that produced this status.
    pub fn event(&self) -> DiscoveryEvent {
        DiscoveryEvent::from_count_change(self.current_count_change)
    }
}

/// Whether a callback announces a new entity or new info for a known one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryEvent {
    Discovered,
    Updated,
}

impl DiscoveryEvent {
    /// `+1` means discovered; every other delta is an update.
    pub fn from_count_change(change: i32) -> Self {
        if change == 1 {
            Self::Discovered
        } else {
            Self::Updated
        }
    }

    /// Trailing phrase used in report lines.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::Discovered => "discovered.",
            Self::Updated => "updated info.",
        }
    }
}
