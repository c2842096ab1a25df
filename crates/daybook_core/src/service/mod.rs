//! Entity use-case services.
//!
//! # Responsibility
//! - Orchestrate collection calls into per-entity APIs for UI/FFI callers.
//! - Keep callers decoupled from storage keys and record bookkeeping.
//!
//! # Invariants
//! - Services never bypass collection mutation semantics (sync-flag reset,
//!   tombstoning, id reconciliation).
//! - Construction is explicit dependency injection: services are built once
//!   at startup from a shared key-value store, never from globals.

pub mod journal_service;
pub mod mood_service;
pub mod reflection_service;
pub mod start_day_service;

pub use journal_service::{JournalPatch, JournalService, NewJournalEntry};
pub use mood_service::{MoodPatch, MoodService, NewMoodCheckin};
pub use reflection_service::{NewReflection, ReflectionPatch, ReflectionService};
pub use start_day_service::{NewStartDay, StartDayPatch, StartDayService};
