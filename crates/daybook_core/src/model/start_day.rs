//! Start-of-day entry model.

use crate::model::record::{RecordId, RecordMeta, SyncRecord};
use serde::{Deserialize, Serialize};

/// Morning planning entry: how the day starts and what it should hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDayEntry {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Free-text morning state ("rested", "anxious", ...).
    pub feeling: Option<String>,
    /// Intentions for the day, in entry order.
    pub priorities: Vec<String>,
}

impl StartDayEntry {
    pub fn new(local_id: RecordId, created_at: String) -> Self {
        Self {
            meta: RecordMeta::new(local_id, created_at),
            feeling: None,
            priorities: Vec::new(),
        }
    }
}

impl SyncRecord for StartDayEntry {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
