//! Shared record identity and sync bookkeeping.
//!
//! # Responsibility
//! - Model the `number | string` identifier union used across entities.
//! - Carry the soft-delete and sync-state flags every record shares.
//!
//! # Invariants
//! - `local_id` is assigned at creation and never changes.
//! - `id` stays `None` until a server acknowledgment supplies it, exactly
//!   once.
//! - Every mutation resets `is_synced` to `false`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Client- or server-side record identifier.
///
/// Numeric ids are epoch-millisecond values whose ordering follows creation
/// order; string ids are opaque. Serialized untagged so persisted JSON holds
/// a plain number or string, matching data written by earlier app versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Bookkeeping fields shared by every persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Server-assigned identifier; `null` until the first sync ack.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Client-generated identifier, stable for the record's lifetime.
    pub local_id: RecordId,
    /// RFC 3339 creation instant, set once and never rewritten.
    pub created_at: String,
    /// Soft-delete tombstone flag.
    #[serde(default)]
    pub is_deleted: bool,
    /// Whether the server has acknowledged the record's current state.
    #[serde(default)]
    pub is_synced: bool,
}

impl RecordMeta {
    /// Fresh bookkeeping for a newly created record.
    pub fn new(local_id: RecordId, created_at: String) -> Self {
        Self {
            id: None,
            local_id,
            created_at,
            is_deleted: false,
            is_synced: false,
        }
    }

    /// Whether `candidate` addresses this record by server id or local id.
    pub fn matches(&self, candidate: &RecordId) -> bool {
        self.id.as_ref() == Some(candidate) || &self.local_id == candidate
    }

    /// Marks the record dirty after any mutation.
    pub fn touch(&mut self) {
        self.is_synced = false;
    }
}

/// Contract every storable entity fulfills: access to shared bookkeeping.
pub trait SyncRecord: Clone + Serialize + DeserializeOwned {
    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Template/draft records are excluded from sync listings.
    fn is_template(&self) -> bool {
        false
    }
}
