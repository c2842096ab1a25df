//! Mood check-in use-case service.
//!
//! # Responsibility
//! - Validated CRUD over mood check-ins.
//! - Day-window queries for streaks and period-over-period analytics.
//! - Mirror every mutation into the offline sync queue.
//!
//! # Invariants
//! - Validation runs before any write; an invalid request leaves both the
//!   collection and the queue untouched.
//! - The check-in is persisted before its queue item; a crash between the
//!   two can leave a mutation unqueued (accepted cross-key gap).
//! - `by_days` measures from local midnight; `by_days_range` measures from
//!   the current instant, lower bound inclusive, upper bound exclusive.

use crate::ids;
use crate::model::mood::{validate_fields, MoodCheckin};
use crate::model::record::{RecordId, SyncRecord};
use crate::repo::{Collection, RepoResult};
use crate::store::{keys, KeyValueStore, StorageMedium};
use crate::sync::{OfflineSyncQueue, PendingChange};
use chrono::{DateTime, Duration, Local};
use log::debug;
use std::collections::BTreeMap;

/// Create request; the level is optional here so its absence can surface
/// as a validation error instead of a type error at the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMoodCheckin {
    pub mood_level: Option<u8>,
    pub emotions: Vec<String>,
    pub note: Option<String>,
}

/// Field-level patch; `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoodPatch {
    pub mood_level: Option<u8>,
    pub emotions: Option<Vec<String>>,
    pub note: Option<String>,
}

/// Mood check-ins plus their offline queue over one shared store.
pub struct MoodService<'kv, M: StorageMedium> {
    checkins: Collection<'kv, M, MoodCheckin>,
    queue: OfflineSyncQueue<'kv, M>,
}

impl<'kv, M: StorageMedium> MoodService<'kv, M> {
    pub fn new(kv: &'kv KeyValueStore<M>) -> Self {
        Self {
            checkins: Collection::new(kv, keys::MOOD_CHECKINS),
            queue: OfflineSyncQueue::new(kv),
        }
    }

    /// Validates and persists a check-in, then queues it for sync.
    pub fn create(&self, request: NewMoodCheckin) -> RepoResult<MoodCheckin> {
        validate_fields(request.mood_level, &request.emotions)?;
        let level = request.mood_level.unwrap_or_default();

        let mut checkin = MoodCheckin::new(
            ids::numeric_id(),
            ids::now_iso(),
            level,
            request.emotions,
        );
        checkin.note = request.note;

        let created = self.checkins.insert(checkin)?;
        self.queue.enqueue(PendingChange::Create(created.clone()))?;
        Ok(created)
    }

    /// Active check-ins in creation order.
    pub fn list(&self) -> Vec<MoodCheckin> {
        self.checkins.list()
    }

    pub fn get(&self, id: &RecordId) -> Option<MoodCheckin> {
        self.checkins.get(id)
    }

    /// Merges `patch`, re-validates the merged record, persists and queues.
    pub fn update(&self, id: &RecordId, patch: MoodPatch) -> RepoResult<MoodCheckin> {
        // Validate against the merged shape before touching storage.
        let current = self
            .checkins
            .get(id)
            .ok_or_else(|| crate::repo::RepoError::NotFound(id.clone()))?;
        let merged_level = patch.mood_level.unwrap_or(current.mood_level);
        let merged_emotions = patch.emotions.clone().unwrap_or_else(|| current.emotions.clone());
        validate_fields(Some(merged_level), &merged_emotions)?;

        let updated = self.checkins.update_with(id, |checkin| {
            checkin.mood_level = merged_level;
            checkin.emotions = merged_emotions;
            if let Some(note) = patch.note {
                checkin.note = Some(note);
            }
        })?;

        self.queue.enqueue(PendingChange::Update(updated.clone()))?;
        Ok(updated)
    }

    /// Tombstones a check-in and queues the deletion.
    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted = self.checkins.soft_delete(id)?;
        self.queue.enqueue(PendingChange::Delete(deleted))?;
        Ok(())
    }

    /// Check-ins created since local midnight `days` days ago, inclusive.
    pub fn by_days(&self, days: i64) -> Vec<MoodCheckin> {
        let lower = local_day_start(days);
        self.filtered(|created| created >= lower)
    }

    /// Check-ins inside the half-open window
    /// `[now - end_days, now - start_days)`, measured from the current
    /// instant. Used to compare a current period against the one before it.
    pub fn by_days_range(&self, start_days: i64, end_days: i64) -> Vec<MoodCheckin> {
        let now = Local::now();
        let lower = now - Duration::days(end_days);
        let upper = now - Duration::days(start_days);
        self.filtered(|created| within_window(created, lower, upper))
    }

    fn filtered(&self, keep: impl Fn(DateTime<Local>) -> bool) -> Vec<MoodCheckin> {
        self.checkins
            .list()
            .into_iter()
            .filter(|checkin| match parse_created_at(&checkin.meta().created_at) {
                Some(created) => keep(created),
                None => {
                    debug!(
                        "event=mood_window module=service status=skipped local_id={} error_code=bad_created_at",
                        checkin.meta().local_id
                    );
                    false
                }
            })
            .collect()
    }

    pub fn list_for_sync(&self) -> Vec<MoodCheckin> {
        self.checkins.list_for_sync()
    }

    pub fn mark_synced(
        &self,
        local_ids: &[RecordId],
        server_ids: &BTreeMap<RecordId, RecordId>,
    ) -> RepoResult<usize> {
        self.checkins.mark_synced(local_ids, server_ids)
    }

    /// The service's durable queue handle, for drain call sites.
    pub fn queue(&self) -> &OfflineSyncQueue<'kv, M> {
        &self.queue
    }
}

fn parse_created_at(created_at: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(created_at)
        .ok()
        .map(|instant| instant.with_timezone(&Local))
}

/// Lower-inclusive, upper-exclusive membership test for a time window.
fn within_window(instant: DateTime<Local>, lower: DateTime<Local>, upper: DateTime<Local>) -> bool {
    instant >= lower && instant < upper
}

/// Local midnight `days_back` days before today. Falls back to a plain
/// 24-hour subtraction when the local calendar cannot name that midnight
/// (DST edge).
fn local_day_start(days_back: i64) -> DateTime<Local> {
    let now = Local::now();
    let date = now.date_naive() - Duration::days(days_back);
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .unwrap_or(now - Duration::days(days_back))
}

#[cfg(test)]
mod tests {
    use super::{local_day_start, parse_created_at, within_window};
    use chrono::{Duration, Local};

    #[test]
    fn window_lower_bound_is_inclusive_and_upper_exclusive() {
        let upper = Local::now();
        let lower = upper - Duration::days(7);

        assert!(within_window(lower, lower, upper));
        assert!(within_window(lower + Duration::seconds(1), lower, upper));
        assert!(!within_window(upper, lower, upper));
        assert!(!within_window(lower - Duration::seconds(1), lower, upper));
    }

    #[test]
    fn day_start_is_midnight_of_the_target_day() {
        let start = local_day_start(3);
        assert_eq!(start.time().format("%H:%M:%S").to_string(), "00:00:00");
        let expected_date = Local::now().date_naive() - Duration::days(3);
        assert_eq!(start.date_naive(), expected_date);
    }

    #[test]
    fn created_at_parser_accepts_rfc3339_and_rejects_garbage() {
        assert!(parse_created_at("2026-08-01T09:30:00+00:00").is_some());
        assert!(parse_created_at("2026-08-01T09:30:00Z").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }
}
