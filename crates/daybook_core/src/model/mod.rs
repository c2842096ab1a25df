//! Canonical persisted record model.
//!
//! # Responsibility
//! - Define the bookkeeping shape shared by every stored entity.
//! - Define the per-entity payload structs and their validation rules.
//!
//! # Invariants
//! - Serde field names (`id`, `local_id`, `created_at`, `is_deleted`,
//!   `is_synced`) are the persisted contract; renaming them breaks data
//!   written by earlier app versions.
//! - Deletion is a soft tombstone, never a physical removal.

pub mod journal;
pub mod mood;
pub mod record;
pub mod reflection;
pub mod start_day;

pub use journal::JournalEntry;
pub use mood::{MoodCheckin, MoodValidationError, MOOD_LEVEL_MAX, MOOD_LEVEL_MIN};
pub use record::{RecordId, RecordMeta, SyncRecord};
pub use reflection::EveningReflection;
pub use start_day::StartDayEntry;
