//! Durable offline mutation queue.
//!
//! # Responsibility
//! - Persist server-bound mood mutations as `{type, data, timestamp}`
//!   items under the queue key.
//! - Drain pending items against the remote collaborator with per-item
//!   failure isolation.
//!
//! # Invariants
//! - Item state only moves `pending → synced`; a failed attempt leaves the
//!   item pending for the next drain, with no backoff or retry cap.
//! - The queue is persisted after every acknowledged item, so partial
//!   progress survives a crash mid-drain.
//! - Remote failures never escape `drain`.

use super::remote::RemoteApi;
use crate::ids;
use crate::model::mood::MoodCheckin;
use crate::model::record::RecordId;
use crate::store::{keys, KeyValueStore, StorageMedium, StoreResult};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

/// Endpoint the queue posts mood mutations to.
pub const MOOD_SYNC_PATH: &str = "/mood/sync";

/// One server-bound mutation, in the persisted `{type, data}` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PendingChange {
    Create(MoodCheckin),
    Update(MoodCheckin),
    Delete(MoodCheckin),
}

/// Queue element: the wire triple plus local bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedChange {
    /// Fresh opaque identifier stamped at enqueue time.
    pub local_id: RecordId,
    /// Contributes the `type` and `data` fields of the wire shape.
    #[serde(flatten)]
    pub change: PendingChange,
    /// Enqueue instant, epoch milliseconds.
    pub timestamp: i64,
    /// Set once the server acknowledges this specific item.
    #[serde(default)]
    pub is_synced: bool,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    pub synced_count: usize,
    pub failed_count: usize,
    pub pending_count: usize,
}

/// Durable queue handle over the shared key-value store.
pub struct OfflineSyncQueue<'kv, M: StorageMedium> {
    kv: &'kv KeyValueStore<M>,
}

impl<'kv, M: StorageMedium> OfflineSyncQueue<'kv, M> {
    pub fn new(kv: &'kv KeyValueStore<M>) -> Self {
        Self { kv }
    }

    fn load(&self) -> Vec<QueuedChange> {
        let value = match self.kv.get_value(keys::MOOD_OFFLINE_QUEUE) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!("event=queue_read module=sync status=degraded error={err}");
                return Vec::new();
            }
        };

        match serde_json::from_value(value) {
            Ok(items) => items,
            Err(err) => {
                error!("event=queue_read module=sync status=degraded error_code=shape_mismatch error={err}");
                Vec::new()
            }
        }
    }

    fn persist(&self, items: &[QueuedChange]) -> StoreResult<()> {
        self.kv.set(keys::MOOD_OFFLINE_QUEUE, &items, false)
    }

    /// Appends a mutation, stamped with the current time and a fresh id.
    pub fn enqueue(&self, change: PendingChange) -> StoreResult<QueuedChange> {
        let item = QueuedChange {
            local_id: ids::string_id(),
            change,
            timestamp: ids::now_epoch_ms(),
            is_synced: false,
        };

        let mut items = self.load();
        items.push(item.clone());
        self.persist(&items)?;
        Ok(item)
    }

    /// All items, acknowledged ones included.
    pub fn all_items(&self) -> Vec<QueuedChange> {
        self.load()
    }

    /// Items still awaiting acknowledgment.
    pub fn pending(&self) -> Vec<QueuedChange> {
        self.load()
            .into_iter()
            .filter(|item| !item.is_synced)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Posts every pending item to the remote collaborator.
    ///
    /// Per-item semantics: an acknowledged item is marked synced and the
    /// queue is persisted immediately; a failed item is logged and left
    /// pending while the drain continues. Remote failures never escape.
    ///
    /// # Errors
    /// - [`crate::store::StoreError::Write`] only, when persisting an
    ///   acknowledgment fails — dropping a confirmed ack would desync the
    ///   queue from the server.
    pub fn drain(&self, remote: &dyn RemoteApi) -> StoreResult<DrainReport> {
        let mut items = self.load();
        let mut report = DrainReport::default();

        for index in 0..items.len() {
            if items[index].is_synced {
                continue;
            }

            let body = match serde_json::to_value(&items[index]) {
                Ok(body) => body,
                Err(err) => {
                    // Malformed items stay pending rather than poisoning the
                    // pass.
                    warn!(
                        "event=queue_drain module=sync status=skipped item={} error={err}",
                        items[index].local_id
                    );
                    report.failed_count += 1;
                    continue;
                }
            };

            match remote.post(MOOD_SYNC_PATH, &body) {
                Ok(_) => {
                    items[index].is_synced = true;
                    self.persist(&items)?;
                    report.synced_count += 1;
                }
                Err(err) => {
                    warn!(
                        "event=queue_drain module=sync status=item_failed item={} error={err}",
                        items[index].local_id
                    );
                    report.failed_count += 1;
                }
            }
        }

        report.pending_count = items.iter().filter(|item| !item.is_synced).count();
        info!(
            "event=queue_drain module=sync status=ok synced={} failed={} pending={}",
            report.synced_count, report.failed_count, report.pending_count
        );
        Ok(report)
    }

    /// Removes acknowledged items from storage. Returns how many were
    /// purged.
    pub fn purge_synced(&self) -> StoreResult<usize> {
        let items = self.load();
        let before = items.len();
        let remaining: Vec<QueuedChange> =
            items.into_iter().filter(|item| !item.is_synced).collect();
        let purged = before - remaining.len();

        if purged > 0 {
            self.persist(&remaining)?;
        }
        Ok(purged)
    }
}
