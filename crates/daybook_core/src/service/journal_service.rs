//! Journal use-case service.
//!
//! # Responsibility
//! - CRUD over diary entries plus the parallel template collection.
//! - Derive the `length` and `preview_text` projections on every content
//!   write.
//! - Convert templates into real entries without losing the template on a
//!   failed conversion.
//!
//! # Invariants
//! - Entry and template collections live under disjoint keys and never
//!   share records.
//! - `convert_template_to_journal` tombstones the template only after the
//!   new entry is persisted.

use crate::ids;
use crate::model::journal::JournalEntry;
use crate::model::record::{RecordId, SyncRecord};
use crate::repo::{Collection, RepoResult};
use crate::store::{keys, KeyValueStore, StorageMedium};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

const PREVIEW_MAX_CHARS: usize = 120;

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Create request for a diary entry or template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewJournalEntry {
    pub title: Option<String>,
    pub content: String,
}

/// Field-level patch; `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JournalPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Journal entries and templates over one shared store.
pub struct JournalService<'kv, M: StorageMedium> {
    entries: Collection<'kv, M, JournalEntry>,
    templates: Collection<'kv, M, JournalEntry>,
}

impl<'kv, M: StorageMedium> JournalService<'kv, M> {
    pub fn new(kv: &'kv KeyValueStore<M>) -> Self {
        Self {
            entries: Collection::new(kv, keys::JOURNAL_ENTRIES),
            templates: Collection::new(kv, keys::JOURNAL_TEMPLATES),
        }
    }

    /// Creates a diary entry with a fresh chronological id and derived
    /// projections.
    pub fn create(&self, request: NewJournalEntry) -> RepoResult<JournalEntry> {
        let mut entry = JournalEntry::new(ids::numeric_id(), ids::now_iso(), request.content);
        entry.title = request.title;
        entry.preview_text = derive_preview(&entry.content);
        self.entries.insert(entry)
    }

    /// Active entries in creation order.
    pub fn list(&self) -> Vec<JournalEntry> {
        self.entries.list()
    }

    pub fn get(&self, id: &RecordId) -> Option<JournalEntry> {
        self.entries.get(id)
    }

    /// Merges `patch` over the stored entry; content writes recompute the
    /// derived projections.
    pub fn update(&self, id: &RecordId, patch: JournalPatch) -> RepoResult<JournalEntry> {
        self.entries.update_with(id, |entry| {
            if let Some(title) = patch.title {
                entry.title = Some(title);
            }
            if let Some(content) = patch.content {
                entry.set_content(content);
                entry.preview_text = derive_preview(&entry.content);
            }
        })
    }

    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.entries.soft_delete(id).map(|_| ())
    }

    pub fn restore(&self, id: &RecordId) -> RepoResult<JournalEntry> {
        self.entries.restore(id)
    }

    pub fn list_for_sync(&self) -> Vec<JournalEntry> {
        self.entries.list_for_sync()
    }

    pub fn mark_synced(
        &self,
        local_ids: &[RecordId],
        server_ids: &BTreeMap<RecordId, RecordId>,
    ) -> RepoResult<usize> {
        self.entries.mark_synced(local_ids, server_ids)
    }

    /// Creates a template: same shape, its own collection, never synced.
    pub fn create_template(&self, request: NewJournalEntry) -> RepoResult<JournalEntry> {
        let mut template = JournalEntry::new(ids::numeric_id(), ids::now_iso(), request.content);
        template.title = request.title;
        template.preview_text = derive_preview(&template.content);
        template.is_template = true;
        self.templates.insert(template)
    }

    pub fn list_templates(&self) -> Vec<JournalEntry> {
        self.templates.list()
    }

    pub fn delete_template(&self, id: &RecordId) -> RepoResult<()> {
        self.templates.soft_delete(id).map(|_| ())
    }

    /// Copies a template's content into a fresh entry, then tombstones the
    /// template.
    ///
    /// Ordering is the atomicity guarantee: when entry creation fails the
    /// template is still there, untouched.
    pub fn convert_template_to_journal(&self, template_id: &RecordId) -> RepoResult<JournalEntry> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| crate::repo::RepoError::NotFound(template_id.clone()))?;

        let entry = self.create(NewJournalEntry {
            title: template.title.clone(),
            content: template.content.clone(),
        })?;

        let template_local_id = template.meta().local_id.clone();
        self.templates.soft_delete(&template_local_id)?;
        Ok(entry)
    }
}

/// Derives the markdown-stripped list preview for an entry body.
///
/// Rules: images dropped, links reduced to their text, markdown symbols
/// removed, whitespace collapsed, first `PREVIEW_MAX_CHARS` chars kept.
pub fn derive_preview(content: &str) -> Option<String> {
    let without_images = IMAGE_RE.replace_all(content, " ");
    let without_links = LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = SYMBOL_RE.replace_all(&without_links, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::derive_preview;

    #[test]
    fn preview_strips_markdown_noise() {
        let source = "# Today\n\n**grateful** for [walks](https://example.com) ![p](a.png)";
        let preview = derive_preview(source).unwrap();
        assert!(!preview.contains('#'));
        assert!(!preview.contains('*'));
        assert!(!preview.contains("a.png"));
        assert!(preview.contains("walks"));
    }

    #[test]
    fn preview_of_symbol_only_content_is_none() {
        assert_eq!(derive_preview("### --- ***"), None);
    }

    #[test]
    fn preview_is_capped() {
        let long = "word ".repeat(100);
        let preview = derive_preview(&long).unwrap();
        assert!(preview.chars().count() <= 120);
    }
}
