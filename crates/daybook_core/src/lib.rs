//! Persistence and synchronization core for the Daybook mobile app.
//! This crate is the single source of truth for storage invariants: the
//! UI layers above it only ever call the use-case services exposed here.

pub mod crypto;
pub mod ids;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use crypto::{CryptoCodec, CryptoError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    EveningReflection, JournalEntry, MoodCheckin, MoodValidationError, RecordId, RecordMeta,
    StartDayEntry, SyncRecord,
};
pub use repo::{Collection, RepoError, RepoResult};
pub use service::{
    JournalPatch, JournalService, MoodPatch, MoodService, NewJournalEntry, NewMoodCheckin,
    NewReflection, NewStartDay, ReflectionPatch, ReflectionService, StartDayPatch, StartDayService,
};
pub use store::{
    KeyValueStore, MemoryMedium, SqliteMedium, StorageMedium, StorageSizeReport, StoreError,
    StoreResult,
};
pub use sync::{DrainReport, OfflineSyncQueue, PendingChange, QueuedChange, RemoteApi};

/// Minimal health-check API for early FFI integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
