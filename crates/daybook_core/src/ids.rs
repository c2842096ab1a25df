//! Identifier and timestamp generation.
//!
//! # Responsibility
//! - Generate client-side record identifiers before a server id exists.
//! - Stamp creation times in the canonical RFC 3339 text form.
//!
//! # Invariants
//! - Numeric ids are epoch milliseconds: chronological ordering of
//!   `local_id` follows creation order for user-paced writes.
//! - String ids are opaque and carry no ordering meaning.

use crate::model::RecordId;
use chrono::Utc;
use uuid::Uuid;

/// Epoch-millisecond numeric id for entities that rely on chronological
/// `local_id` ordering (journal, mood, start-day).
///
/// Collisions are a theoretical concern only: creations are user-paced.
pub fn numeric_id() -> RecordId {
    RecordId::Int(Utc::now().timestamp_millis())
}

/// Opaque string id for entities whose identifier must not read as a
/// sequence number (reflections, queue items).
pub fn string_id() -> RecordId {
    RecordId::Str(Uuid::new_v4().to_string())
}

/// Current instant in RFC 3339 form, the persisted `created_at` format.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Current epoch milliseconds, the persisted queue timestamp format.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
