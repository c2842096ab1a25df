//! Evening reflection use-case service.
//!
//! Reflections are the one entity family on opaque string identifiers;
//! everything else follows the shared collection semantics.

use crate::ids;
use crate::model::record::RecordId;
use crate::model::reflection::EveningReflection;
use crate::repo::{Collection, RepoResult};
use crate::store::{keys, KeyValueStore, StorageMedium};
use std::collections::BTreeMap;

/// Create request for an evening reflection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewReflection {
    pub highlights: String,
    pub improvements: String,
    pub gratitude: Option<String>,
}

/// Field-level patch; `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReflectionPatch {
    pub highlights: Option<String>,
    pub improvements: Option<String>,
    pub gratitude: Option<String>,
}

/// Evening reflections over the shared store.
pub struct ReflectionService<'kv, M: StorageMedium> {
    reflections: Collection<'kv, M, EveningReflection>,
}

impl<'kv, M: StorageMedium> ReflectionService<'kv, M> {
    pub fn new(kv: &'kv KeyValueStore<M>) -> Self {
        Self {
            reflections: Collection::new(kv, keys::EVENING_REFLECTIONS),
        }
    }

    pub fn create(&self, request: NewReflection) -> RepoResult<EveningReflection> {
        let mut reflection = EveningReflection::new(
            ids::string_id(),
            ids::now_iso(),
            request.highlights,
            request.improvements,
        );
        reflection.gratitude = request.gratitude;
        self.reflections.insert(reflection)
    }

    pub fn list(&self) -> Vec<EveningReflection> {
        self.reflections.list()
    }

    pub fn get(&self, id: &RecordId) -> Option<EveningReflection> {
        self.reflections.get(id)
    }

    pub fn update(&self, id: &RecordId, patch: ReflectionPatch) -> RepoResult<EveningReflection> {
        self.reflections.update_with(id, |reflection| {
            if let Some(highlights) = patch.highlights {
                reflection.highlights = highlights;
            }
            if let Some(improvements) = patch.improvements {
                reflection.improvements = improvements;
            }
            if let Some(gratitude) = patch.gratitude {
                reflection.gratitude = Some(gratitude);
            }
        })
    }

    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.reflections.soft_delete(id).map(|_| ())
    }

    pub fn list_for_sync(&self) -> Vec<EveningReflection> {
        self.reflections.list_for_sync()
    }

    pub fn mark_synced(
        &self,
        local_ids: &[RecordId],
        server_ids: &BTreeMap<RecordId, RecordId>,
    ) -> RepoResult<usize> {
        self.reflections.mark_synced(local_ids, server_ids)
    }
}
