//! Key-value persistence boundary.
//!
//! # Responsibility
//! - Define the storage error taxonomy shared by every persistence caller.
//! - Name the collection keys owned by this core.
//!
//! # Invariants
//! - Write failures always propagate; silent write loss is a correctness
//!   bug. Read-side leniency lives in [`kv::KeyValueStore`], not here.
//! - Each entity type owns a disjoint key and never touches another
//!   entity's key outside explicit repair.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv;
pub mod medium;
pub mod repair;

pub use kv::{KeyValueStore, KeySizeEntry, StorageSizeReport, ENCRYPTED_MARKER, NAMESPACE_PREFIX};
pub use medium::{MemoryMedium, SqliteMedium, StorageMedium};
pub use repair::{repair, repair_collections, RepairOutcome};

/// Collection keys, stored under the application namespace prefix.
///
/// The literal values are a compatibility contract with persisted data.
pub mod keys {
    pub const JOURNAL_ENTRIES: &str = "journal-entries";
    pub const JOURNAL_TEMPLATES: &str = "journal-templates";
    pub const MOOD_CHECKINS: &str = "mood-checkins";
    pub const MOOD_OFFLINE_QUEUE: &str = "mood-offline-queue";
    pub const START_DAY_ENTRIES: &str = "start-day";
    pub const EVENING_REFLECTIONS: &str = "evening-reflections";

    /// Every collection key holding the canonical array-of-records shape.
    pub const ALL_COLLECTIONS: &[&str] = &[
        JOURNAL_ENTRIES,
        JOURNAL_TEMPLATES,
        MOOD_CHECKINS,
        MOOD_OFFLINE_QUEUE,
        START_DAY_ENTRIES,
        EVENING_REFLECTIONS,
    ];
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type MediumResult<T> = Result<T, MediumError>;

/// Failure inside a concrete storage medium.
#[derive(Debug)]
pub enum MediumError {
    Sqlite(rusqlite::Error),
    /// Non-SQLite backends and fault-injecting test doubles.
    Backend(String),
}

impl Display for MediumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Backend(detail) => write!(f, "{detail}"),
        }
    }
}

impl Error for MediumError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Backend(_) => None,
        }
    }
}

impl From<rusqlite::Error> for MediumError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Storage-layer error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying medium unreadable for one key.
    Read { key: String, source: MediumError },
    /// Underlying medium unwritable for one key; never swallowed.
    Write { key: String, source: MediumError },
    /// Medium bootstrap (open/pragma/migration) failure.
    Open(MediumError),
    /// Persisted schema is newer than this binary supports.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { key, source } => write!(f, "storage read failed for `{key}`: {source}"),
            Self::Write { key, source } => write!(f, "storage write failed for `{key}`: {source}"),
            Self::Open(source) => write!(f, "storage open failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "storage schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } | Self::Open(source) => {
                Some(source)
            }
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}
