//! Generic record collection over one storage key.
//!
//! # Responsibility
//! - Implement the shared CRUD mechanics every entity service builds on:
//!   soft-delete, sync-state bookkeeping, id reconciliation.
//! - Keep the whole-collection read-modify-write cycle in one place.
//!
//! # Invariants
//! - Records keep insertion order; creation order is storage order.
//! - Tombstoned records stay in storage until a sync round or an explicit
//!   clear removes them.
//! - Every mutation leaves the affected record with `is_synced = false`.
//! - Mutation targets are located by server id or local id, tombstones
//!   excluded.

use super::{RepoError, RepoResult};
use crate::model::record::{RecordId, SyncRecord};
use crate::store::{KeyValueStore, StorageMedium, StoreResult};
use log::error;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Typed view of one collection key.
pub struct Collection<'kv, M: StorageMedium, T: SyncRecord> {
    kv: &'kv KeyValueStore<M>,
    key: &'static str,
    _record: PhantomData<T>,
}

impl<'kv, M: StorageMedium, T: SyncRecord> Collection<'kv, M, T> {
    pub fn new(kv: &'kv KeyValueStore<M>, key: &'static str) -> Self {
        Self {
            kv,
            key,
            _record: PhantomData,
        }
    }

    /// The storage key this collection owns.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Reads the full stored sequence, tombstones included.
    ///
    /// Degrades to empty on read failure or malformed payloads: a broken
    /// read shows an empty state, it never crashes the caller.
    pub fn all_records(&self) -> Vec<T> {
        let value = match self.kv.get_value(self.key) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!(
                    "event=collection_read module=repo status=degraded key={} error={err}",
                    self.key
                );
                return Vec::new();
            }
        };

        if !value.is_array() {
            error!(
                "event=collection_read module=repo status=degraded key={} error_code=not_an_array",
                self.key
            );
            return Vec::new();
        }

        match serde_json::from_value(value) {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "event=collection_read module=repo status=degraded key={} error_code=shape_mismatch error={err}",
                    self.key
                );
                Vec::new()
            }
        }
    }

    fn persist(&self, records: &[T]) -> StoreResult<()> {
        self.kv.set(self.key, &records, false)
    }

    /// Active records in storage order.
    pub fn list(&self) -> Vec<T> {
        self.all_records()
            .into_iter()
            .filter(|record| !record.meta().is_deleted)
            .collect()
    }

    /// One active record by server id or local id; `None` when absent.
    pub fn get(&self, id: &RecordId) -> Option<T> {
        self.list()
            .into_iter()
            .find(|record| record.meta().matches(id))
    }

    /// Appends a record and persists the collection.
    pub fn insert(&self, record: T) -> RepoResult<T> {
        let mut records = self.all_records();
        records.push(record.clone());
        self.persist(&records)?;
        Ok(record)
    }

    /// Applies `mutate` to the addressed active record, resets its sync
    /// flag, and persists.
    ///
    /// # Errors
    /// - [`RepoError::NotFound`] when no active record matches `id`.
    pub fn update_with(&self, id: &RecordId, mutate: impl FnOnce(&mut T)) -> RepoResult<T> {
        let mut records = self.all_records();
        let target = records
            .iter_mut()
            .find(|record| record.meta().matches(id) && !record.meta().is_deleted)
            .ok_or_else(|| RepoError::NotFound(id.clone()))?;

        mutate(target);
        target.meta_mut().touch();
        let updated = target.clone();
        self.persist(&records)?;
        Ok(updated)
    }

    /// Tombstones the addressed record. The record stays in storage until a
    /// sync round consumes it.
    pub fn soft_delete(&self, id: &RecordId) -> RepoResult<T> {
        self.update_with(id, |record| record.meta_mut().is_deleted = true)
    }

    /// Clears a tombstone; the record counts as a fresh local mutation.
    pub fn restore(&self, id: &RecordId) -> RepoResult<T> {
        let mut records = self.all_records();
        let target = records
            .iter_mut()
            .find(|record| record.meta().matches(id) && record.meta().is_deleted)
            .ok_or_else(|| RepoError::NotFound(id.clone()))?;

        target.meta_mut().is_deleted = false;
        target.meta_mut().touch();
        let restored = target.clone();
        self.persist(&records)?;
        Ok(restored)
    }

    /// Records awaiting a server acknowledgment: unsynced, non-template.
    /// Tombstones are included; deletions must reach the server too.
    pub fn list_for_sync(&self) -> Vec<T> {
        self.all_records()
            .into_iter()
            .filter(|record| !record.meta().is_synced && !record.is_template())
            .collect()
    }

    /// Acknowledges the listed records: sets `is_synced`, and adopts the
    /// server id where `server_ids` provides one. Returns how many records
    /// were acknowledged.
    pub fn mark_synced(
        &self,
        local_ids: &[RecordId],
        server_ids: &BTreeMap<RecordId, RecordId>,
    ) -> RepoResult<usize> {
        let mut records = self.all_records();
        let mut acknowledged = 0usize;

        for record in records.iter_mut() {
            let local_id = record.meta().local_id.clone();
            if !local_ids.contains(&local_id) {
                continue;
            }
            record.meta_mut().is_synced = true;
            if let Some(server_id) = server_ids.get(&local_id) {
                record.meta_mut().id = Some(server_id.clone());
            }
            acknowledged += 1;
        }

        self.persist(&records)?;
        Ok(acknowledged)
    }

    /// Raw JSON view of the stored payload, for diagnostics and tests.
    pub fn raw_value(&self) -> StoreResult<Option<Value>> {
        self.kv.get_value(self.key)
    }
}
