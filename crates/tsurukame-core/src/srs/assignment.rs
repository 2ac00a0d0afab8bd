//! Assignment - a user's progress on one subject
//!
//! Carries the SRS stage plus the timestamps the API reports, and derives
//! the next review slot and the projected Guru date from them.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use super::stage::SrsStage;
use crate::model::SubjectType;

/// Returned by [`Assignment::guru_date`] for items that already reached Guru
/// but have no recorded pass date.
pub const GURU_IN_PAST: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Progress record for one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Assignment id
    pub id: i64,
    /// Subject this assignment tracks
    pub subject_id: i64,
    /// Radical, kanji or vocabulary
    pub subject_type: SubjectType,
    /// Vocabulary written in kana only
    #[serde(default)]
    pub is_kana_only_vocab: bool,
    /// Current stage; `None` while the subject is still locked
    pub srs_stage: Option<SrsStage>,
    /// Level of the subject (0 when unknown)
    pub level: i32,
    /// When the next review becomes available
    pub available_at: Option<DateTime<Utc>>,
    /// When the lesson was done
    pub started_at: Option<DateTime<Utc>>,
    /// When the item first reached Guru
    pub passed_at: Option<DateTime<Utc>>,
    /// When the item was burned
    pub burned_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Locked items have no stage yet
    pub fn is_locked(&self) -> bool {
        self.srs_stage.is_none()
    }

    /// Stage, treating locked items as `Unlocking`
    pub fn stage(&self) -> SrsStage {
        self.srs_stage.unwrap_or_default()
    }

    /// Waiting for its lesson
    pub fn is_lesson_stage(&self) -> bool {
        !self.is_locked() && self.started_at.is_none() && self.stage() == SrsStage::Unlocking
    }

    /// Scheduled for a review
    pub fn is_review_stage(&self) -> bool {
        !self.is_locked() && self.available_at.is_some()
    }

    /// Reached the end of the ladder
    pub fn is_burned(&self) -> bool {
        self.srs_stage == Some(SrsStage::Burned)
    }

    /// The hour the next review is expected in.
    ///
    /// Reviews that are already available are treated as happening in the
    /// current hour; future ones at their availability time. Locked and
    /// burned items have no review date.
    pub fn review_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_burned() || self.is_locked() {
            return None;
        }

        let this_hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
        match self.available_at {
            Some(available_at) if this_hour < available_at => Some(available_at),
            _ => Some(this_hour),
        }
    }

    /// Earliest time this item can reach Guru I.
    ///
    /// Items at or past Guru I return their pass date, or [`GURU_IN_PAST`]
    /// when none was recorded. Otherwise the next review is assumed to be
    /// answered correctly and every later apprentice interval is added.
    pub fn guru_date(&self, subject_level: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.stage() >= SrsStage::Guru1 {
            return Some(self.passed_at.unwrap_or(GURU_IN_PAST));
        }

        let remaining = self.stage().next().minimum_time_until_guru(subject_level);
        self.review_date(now).map(|review| review + remaining)
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Self {
            id: 0,
            subject_id: 0,
            subject_type: SubjectType::Radical,
            is_kana_only_vocab: false,
            srs_stage: None,
            level: 0,
            available_at: None,
            started_at: None,
            passed_at: None,
            burned_at: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
