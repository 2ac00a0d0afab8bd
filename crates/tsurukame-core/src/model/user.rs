//! User profile and level progressions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub level: i32,
    pub profile_url: String,
    pub started_at: Option<DateTime<Utc>>,
    pub vacation_started_at: Option<DateTime<Utc>>,
    pub subscribed: bool,
    pub max_level_granted_by_subscription: i32,
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

impl User {
    /// Level the user can actually study (capped by the subscription)
    pub fn current_level(&self) -> i32 {
        self.level.min(self.max_level_granted_by_subscription)
    }

    /// Whether vacation mode is on
    pub fn on_vacation(&self) -> bool {
        self.vacation_started_at.is_some()
    }
}

/// Progress through one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgression {
    pub id: i64,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub passed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub abandoned_at: Option<DateTime<Utc>>,
}

impl LevelProgression {
    /// Time spent on this level so far (or in total once passed).
    ///
    /// Counts from `started_at`, or from `unlocked_at` when the level was
    /// never explicitly started. Zero for levels that aren't unlocked.
    pub fn time_spent_current(&self, now: DateTime<Utc>) -> Duration {
        let Some(unlocked_at) = self.unlocked_at else {
            return Duration::zero();
        };
        let start = self.started_at.unwrap_or(unlocked_at);
        self.passed_at.unwrap_or(now) - start
    }
}
