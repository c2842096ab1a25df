//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level storage functions to Dart via FRB.
//! - Keep error semantics simple envelopes for the UI layer.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Storage is initialized once per process; calls before `init_storage`
//!   return failure envelopes instead of opening implicit stores.

use daybook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    JournalPatch, JournalService, KeyValueStore, MoodService, NewJournalEntry, NewMoodCheckin,
    RecordId, SqliteMedium,
};
use std::path::PathBuf;
use std::sync::OnceLock;

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking, never throws.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Idempotent for an identical `(level, log_dir)` pair.
/// - Never panics; returns empty string on success and an error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the storage database path and runs startup format repair.
///
/// # FFI contract
/// - First call wins; later calls with the same path succeed, a different
///   path is rejected.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_storage(db_path: String) -> String {
    let path = PathBuf::from(db_path.trim());
    if path.as_os_str().is_empty() {
        return "db_path cannot be empty".to_string();
    }

    let pinned = STORE_DB_PATH.get_or_init(|| path.clone());
    if pinned != &path {
        return format!(
            "storage already initialized at `{}`; refusing to switch to `{}`",
            pinned.display(),
            path.display()
        );
    }

    match open_store() {
        Ok(kv) => match kv.repair_collections() {
            Ok(()) => {
                log::info!(
                    "event=storage_init module=ffi status=ok db_path={}",
                    path.display()
                );
                String::new()
            }
            Err(err) => err.to_string(),
        },
        Err(err) => err,
    }
}

fn open_store() -> Result<KeyValueStore<SqliteMedium>, String> {
    let path = STORE_DB_PATH
        .get()
        .ok_or_else(|| "storage not initialized; call init_storage first".to_string())?;
    let medium = SqliteMedium::open(path).map_err(|err| err.to_string())?;
    Ok(KeyValueStore::new(medium))
}

/// Generic action response envelope for command flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Stable record id in string form, when one was created or touched.
    pub record_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// Journal entry projection for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalItem {
    /// Stable id in string form (server id when synced, local id before).
    pub record_id: String,
    pub title: Option<String>,
    pub preview: Option<String>,
    pub created_at: String,
    pub length: u32,
    pub is_synced: bool,
}

/// List response envelope for journal flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalListResponse {
    pub items: Vec<JournalItem>,
    pub message: String,
}

fn parse_record_id(raw: &str) -> RecordId {
    match raw.trim().parse::<i64>() {
        Ok(value) => RecordId::Int(value),
        Err(_) => RecordId::Str(raw.trim().to_string()),
    }
}

fn journal_item(entry: &daybook_core::JournalEntry) -> JournalItem {
    let record_id = entry
        .meta
        .id
        .as_ref()
        .unwrap_or(&entry.meta.local_id)
        .to_string();
    JournalItem {
        record_id,
        title: entry.title.clone(),
        preview: entry.preview_text.clone(),
        created_at: entry.meta.created_at.clone(),
        length: entry.length,
        is_synced: entry.meta.is_synced,
    }
}

/// Creates a diary entry.
///
/// # FFI contract
/// - Never panics; failures are reported through the envelope.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_create(title: Option<String>, content: String) -> ActionResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => return ActionResponse::failure(err),
    };

    let journal = JournalService::new(&kv);
    match journal.create(NewJournalEntry { title, content }) {
        Ok(entry) => ActionResponse::success(
            "journal entry created",
            Some(entry.meta.local_id.to_string()),
        ),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Lists active diary entries in creation order.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_list() -> JournalListResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => {
            return JournalListResponse {
                items: Vec::new(),
                message: err,
            }
        }
    };

    let journal = JournalService::new(&kv);
    let items = journal.list().iter().map(journal_item).collect::<Vec<_>>();
    let message = format!("{} entries", items.len());
    JournalListResponse { items, message }
}

/// Replaces entry fields addressed by server or local id.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_update(
    record_id: String,
    title: Option<String>,
    content: Option<String>,
) -> ActionResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => return ActionResponse::failure(err),
    };

    let journal = JournalService::new(&kv);
    let id = parse_record_id(&record_id);
    match journal.update(&id, JournalPatch { title, content }) {
        Ok(entry) => {
            ActionResponse::success("journal entry updated", Some(entry.meta.local_id.to_string()))
        }
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Soft-deletes an entry addressed by server or local id.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_delete(record_id: String) -> ActionResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => return ActionResponse::failure(err),
    };

    let journal = JournalService::new(&kv);
    let id = parse_record_id(&record_id);
    match journal.delete(&id) {
        Ok(()) => ActionResponse::success("journal entry deleted", Some(record_id)),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Records a mood check-in; validation failures come back in the envelope.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_checkin(
    mood_level: Option<u8>,
    emotions: Vec<String>,
    note: Option<String>,
) -> ActionResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => return ActionResponse::failure(err),
    };

    let mood = MoodService::new(&kv);
    match mood.create(NewMoodCheckin {
        mood_level,
        emotions,
        note,
    }) {
        Ok(checkin) => ActionResponse::success(
            "mood check-in recorded",
            Some(checkin.meta.local_id.to_string()),
        ),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Number of queued mood mutations still awaiting sync.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_pending_sync_count() -> u32 {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(_) => return 0,
    };
    let mood = MoodService::new(&kv);
    mood.queue().pending_count() as u32
}

/// Per-key entry of the storage size report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeySize {
    pub key: String,
    pub bytes: u64,
    pub preview: String,
}

/// Storage size report for the inspection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSizeResponse {
    pub ok: bool,
    pub total_bytes: u64,
    pub entries: Vec<StorageKeySize>,
    pub message: String,
}

/// Diagnostic storage footprint, sorted descending by size.
#[flutter_rust_bridge::frb(sync)]
pub fn storage_size() -> StorageSizeResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => {
            return StorageSizeResponse {
                ok: false,
                total_bytes: 0,
                entries: Vec::new(),
                message: err,
            }
        }
    };

    match kv.storage_size() {
        Ok(report) => StorageSizeResponse {
            ok: true,
            total_bytes: report.total_bytes as u64,
            entries: report
                .entries
                .into_iter()
                .map(|entry| StorageKeySize {
                    key: entry.key,
                    bytes: entry.bytes as u64,
                    preview: entry.preview,
                })
                .collect(),
            message: String::new(),
        },
        Err(err) => StorageSizeResponse {
            ok: false,
            total_bytes: 0,
            entries: Vec::new(),
            message: err.to_string(),
        },
    }
}

/// Re-runs format repair across every collection key.
#[flutter_rust_bridge::frb(sync)]
pub fn repair_storage() -> ActionResponse {
    let kv = match open_store() {
        Ok(kv) => kv,
        Err(err) => return ActionResponse::failure(err),
    };

    match kv.repair_collections() {
        Ok(()) => ActionResponse::success("storage repaired", None),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}
