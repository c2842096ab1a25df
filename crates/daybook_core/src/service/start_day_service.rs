//! Start-of-day entry use-case service.

use crate::ids;
use crate::model::record::RecordId;
use crate::model::start_day::StartDayEntry;
use crate::repo::{Collection, RepoResult};
use crate::store::{keys, KeyValueStore, StorageMedium};
use std::collections::BTreeMap;

/// Create request for a morning entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewStartDay {
    pub feeling: Option<String>,
    pub priorities: Vec<String>,
}

/// Field-level patch; `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartDayPatch {
    pub feeling: Option<String>,
    pub priorities: Option<Vec<String>>,
}

/// Morning entries over the shared store.
pub struct StartDayService<'kv, M: StorageMedium> {
    entries: Collection<'kv, M, StartDayEntry>,
}

impl<'kv, M: StorageMedium> StartDayService<'kv, M> {
    pub fn new(kv: &'kv KeyValueStore<M>) -> Self {
        Self {
            entries: Collection::new(kv, keys::START_DAY_ENTRIES),
        }
    }

    pub fn create(&self, request: NewStartDay) -> RepoResult<StartDayEntry> {
        let mut entry = StartDayEntry::new(ids::numeric_id(), ids::now_iso());
        entry.feeling = request.feeling;
        entry.priorities = request.priorities;
        self.entries.insert(entry)
    }

    pub fn list(&self) -> Vec<StartDayEntry> {
        self.entries.list()
    }

    pub fn get(&self, id: &RecordId) -> Option<StartDayEntry> {
        self.entries.get(id)
    }

    pub fn update(&self, id: &RecordId, patch: StartDayPatch) -> RepoResult<StartDayEntry> {
        self.entries.update_with(id, |entry| {
            if let Some(feeling) = patch.feeling {
                entry.feeling = Some(feeling);
            }
            if let Some(priorities) = patch.priorities {
                entry.priorities = priorities;
            }
        })
    }

    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.entries.soft_delete(id).map(|_| ())
    }

    pub fn list_for_sync(&self) -> Vec<StartDayEntry> {
        self.entries.list_for_sync()
    }

    pub fn mark_synced(
        &self,
        local_ids: &[RecordId],
        server_ids: &BTreeMap<RecordId, RecordId>,
    ) -> RepoResult<usize> {
        self.entries.mark_synced(local_ids, server_ids)
    }
}
