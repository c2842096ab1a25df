//! Mood check-in model and validation.
//!
//! # Responsibility
//! - Define the persisted mood check-in shape.
//! - Enforce required-field rules before any write is attempted.
//!
//! # Invariants
//! - `mood_level` stays within `MOOD_LEVEL_MIN..=MOOD_LEVEL_MAX`.
//! - `emotions` is never empty for a persisted check-in.

use crate::model::record::{RecordId, RecordMeta, SyncRecord};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MOOD_LEVEL_MIN: u8 = 1;
pub const MOOD_LEVEL_MAX: u8 = 5;

/// Required-field failures, raised before any storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoodValidationError {
    /// Caller did not supply a mood level.
    MissingMoodLevel,
    /// Supplied level falls outside the supported scale.
    MoodLevelOutOfRange(u8),
    /// A check-in must name at least one emotion.
    EmptyEmotions,
}

impl Display for MoodValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMoodLevel => write!(f, "mood_level is required"),
            Self::MoodLevelOutOfRange(value) => write!(
                f,
                "mood_level {value} is outside {MOOD_LEVEL_MIN}..={MOOD_LEVEL_MAX}"
            ),
            Self::EmptyEmotions => write!(f, "emotions must contain at least one entry"),
        }
    }
}

impl Error for MoodValidationError {}

/// One mood check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodCheckin {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Scale position, `MOOD_LEVEL_MIN..=MOOD_LEVEL_MAX`.
    pub mood_level: u8,
    /// Selected emotion labels; never empty.
    pub emotions: Vec<String>,
    /// Optional free-text annotation.
    pub note: Option<String>,
}

impl MoodCheckin {
    pub fn new(
        local_id: RecordId,
        created_at: String,
        mood_level: u8,
        emotions: Vec<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(local_id, created_at),
            mood_level,
            emotions,
            note: None,
        }
    }

    /// Checks the persisted-shape invariants.
    pub fn validate(&self) -> Result<(), MoodValidationError> {
        validate_fields(Some(self.mood_level), &self.emotions)
    }
}

/// Shared rule for constructors and create requests, where the level may be
/// absent entirely.
pub fn validate_fields(
    mood_level: Option<u8>,
    emotions: &[String],
) -> Result<(), MoodValidationError> {
    let level = mood_level.ok_or(MoodValidationError::MissingMoodLevel)?;
    if !(MOOD_LEVEL_MIN..=MOOD_LEVEL_MAX).contains(&level) {
        return Err(MoodValidationError::MoodLevelOutOfRange(level));
    }
    if emotions.iter().all(|emotion| emotion.trim().is_empty()) {
        return Err(MoodValidationError::EmptyEmotions);
    }
    Ok(())
}

impl SyncRecord for MoodCheckin {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
