//! Evening reflection model.
//!
//! Reflections use opaque string identifiers: their ids travel into
//! export payloads where a bare sequence number would leak creation
//! ordering.

use crate::model::record::{RecordId, RecordMeta, SyncRecord};
use serde::{Deserialize, Serialize};

/// End-of-day reflection entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EveningReflection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// What went well today.
    pub highlights: String,
    /// What could have gone better.
    pub improvements: String,
    /// Optional gratitude note.
    pub gratitude: Option<String>,
}

impl EveningReflection {
    pub fn new(
        local_id: RecordId,
        created_at: String,
        highlights: impl Into<String>,
        improvements: impl Into<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(local_id, created_at),
            highlights: highlights.into(),
            improvements: improvements.into(),
            gratitude: None,
        }
    }
}

impl SyncRecord for EveningReflection {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
