//! The record abstraction every synchronized collection is built on.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ValidationError;
use crate::ids::RecordId;

/// A record type mirrored from a remote collection.
///
/// `Draft` is the create payload (no id, no server timestamps) and `Patch`
/// the partial update payload. Field access for searching and sorting goes
/// through [`Entity::searchable_text`] and [`Entity::sort_value`] so the
/// derived view stays generic.
pub trait Entity:
    Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type Draft: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    type Patch: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Collection name used by the remote gateway (e.g. `"roles"`).
    const COLLECTION: &'static str;

    fn id(&self) -> &RecordId;

    /// Minimal required-field checks run before a create leaves the client.
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// Checks run before an update leaves the client.
    fn validate_patch(_patch: &Self::Patch) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Materializes a record the way the server does on create.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Stamps server-computed fields after an update. No-op for entities
    /// without an `updatedAt`.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Merges the server's answer into the mirrored copy.
    ///
    /// The server is authoritative for every field it returns, so the default
    /// replaces the local value wholesale.
    fn reconcile(&mut self, server: Self) {
        *self = server;
    }

    /// Fields that participate in free-text search.
    fn searchable_text(&self) -> Vec<&str>;

    /// Value of `key` for sorting; unknown keys yield [`SortValue::Missing`].
    fn sort_value(&self, key: &str) -> SortValue;

    /// Name checked against the delete protection set, if this entity kind
    /// has one.
    fn protected_name(&self) -> Option<&str> {
        None
    }
}

/// Comparable projection of a record field.
///
/// Ordering: `Missing < Bool < Number/Timestamp < Text`. Numbers and
/// timestamps compare numerically with each other.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Bool(bool),
    Number(f64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Text(String),
}

impl SortValue {
    /// Classifies raw text: numeric-like and date-like strings become
    /// comparable numbers instead of being compared lexically.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        if let Some(ms) = parse_date_ms(trimmed) {
            return Self::Timestamp(ms);
        }
        Self::Text(raw.to_string())
    }

    pub fn from_optional_text(raw: Option<&str>) -> Self {
        raw.map(Self::from_text).unwrap_or(Self::Missing)
    }

    pub fn timestamp(at: &DateTime<Utc>) -> Self {
        Self::Timestamp(at.timestamp_millis())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Bool(_) => 1,
            Self::Number(_) | Self::Timestamp(_) => 2,
            Self::Text(_) => 3,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Timestamp(ms) => Some(*ms as f64),
            _ => None,
        }
    }

    /// Total order used by the derived view.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

fn parse_date_ms(raw: &str) -> Option<i64> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
