//! Journal entry model.
//!
//! # Responsibility
//! - Define the persisted shape of diary entries and their templates.
//! - Keep the derived `length` projection consistent with `content`.
//!
//! # Invariants
//! - `length` always equals the character count of `content`.
//! - Templates share this shape and live in their own collection key;
//!   `is_template` additionally marks them so they never enter sync
//!   listings.

use crate::model::record::{RecordId, RecordMeta, SyncRecord};
use serde::{Deserialize, Serialize};

/// One diary entry (or entry template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Optional short title shown in list screens.
    pub title: Option<String>,
    /// Markdown body.
    pub content: String,
    /// Character count of `content`, derived on every content write.
    pub length: u32,
    /// Markdown-stripped summary for list screens.
    pub preview_text: Option<String>,
    /// Template marker; template records are drafts, never synced.
    #[serde(default)]
    pub is_template: bool,
}

impl JournalEntry {
    /// New entry with derived `length`; preview derivation is a service
    /// concern.
    pub fn new(local_id: RecordId, created_at: String, content: impl Into<String>) -> Self {
        let content = content.into();
        let length = content_length(&content);
        Self {
            meta: RecordMeta::new(local_id, created_at),
            title: None,
            content,
            length,
            preview_text: None,
            is_template: false,
        }
    }

    /// Replaces the body and recomputes the `length` projection.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.length = content_length(&self.content);
    }
}

/// Character count used for the persisted `length` field.
pub fn content_length(content: &str) -> u32 {
    content.chars().count() as u32
}

impl SyncRecord for JournalEntry {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn is_template(&self) -> bool {
        self.is_template
    }
}

#[cfg(test)]
mod tests {
    use super::{content_length, JournalEntry};
    use crate::model::record::RecordId;

    #[test]
    fn new_entry_derives_length_from_chars_not_bytes() {
        let entry = JournalEntry::new(RecordId::Int(1), "2026-08-01T09:00:00+00:00".into(), "héllo");
        assert_eq!(entry.length, 5);
        assert!(!entry.is_template);
        assert!(entry.meta.id.is_none());
    }

    #[test]
    fn set_content_keeps_length_in_step() {
        let mut entry =
            JournalEntry::new(RecordId::Int(1), "2026-08-01T09:00:00+00:00".into(), "hello");
        entry.set_content("hello world");
        assert_eq!(entry.length, 11);
    }

    #[test]
    fn length_counts_characters() {
        assert_eq!(content_length(""), 0);
        assert_eq!(content_length("hello"), 5);
        assert_eq!(content_length("día ✨"), 5);
    }
}
