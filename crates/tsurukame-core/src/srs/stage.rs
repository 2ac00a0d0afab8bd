//! SRS Stages
//!
//! The WaniKani ladder: a lesson unlocks an item at Apprentice I, each correct
//! review moves it one rung up, and Burned is the end of the line.

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Subjects at or below this level use the accelerated apprentice intervals
pub const ACCELERATED_LEVEL_MAX: i32 = 2;

/// Hours from each apprentice stage to the next one (Apprentice I..IV)
const APPRENTICE_HOURS: [i64; 4] = [4, 8, 23, 47];

/// Same as [`APPRENTICE_HOURS`] for accelerated levels
const ACCELERATED_APPRENTICE_HOURS: [i64; 4] = [2, 4, 8, 23];

/// Whether subjects at `level` use the accelerated intervals
#[inline]
pub fn is_accelerated_level(level: i32) -> bool {
    level <= ACCELERATED_LEVEL_MAX
}

// ============================================================================
// SRS STAGE CATEGORY
// ============================================================================

/// Display grouping of stages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SrsStageCategory {
    #[default]
    Apprentice,
    Guru,
    Master,
    Enlightened,
    Burned,
}

impl SrsStageCategory {
    /// All categories in ladder order
    pub const ALL: [SrsStageCategory; 5] = [
        SrsStageCategory::Apprentice,
        SrsStageCategory::Guru,
        SrsStageCategory::Master,
        SrsStageCategory::Enlightened,
        SrsStageCategory::Burned,
    ];

    /// The lowest stage belonging to this category
    pub fn first_stage(&self) -> SrsStage {
        match self {
            SrsStageCategory::Apprentice => SrsStage::Apprentice1,
            SrsStageCategory::Guru => SrsStage::Guru1,
            SrsStageCategory::Master => SrsStage::Master,
            SrsStageCategory::Enlightened => SrsStage::Enlightened,
            SrsStageCategory::Burned => SrsStage::Burned,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SrsStageCategory::Apprentice => "Apprentice",
            SrsStageCategory::Guru => "Guru",
            SrsStageCategory::Master => "Master",
            SrsStageCategory::Enlightened => "Enlightened",
            SrsStageCategory::Burned => "Burned",
        }
    }
}

impl std::fmt::Display for SrsStageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// SRS STAGE
// ============================================================================

/// Position of an assignment on the SRS ladder.
///
/// Variants are declared in ladder order so the derived `Ord` is the
/// progression order. The wire value is [`SrsStage::number`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "i32", into = "i32")]
pub enum SrsStage {
    /// Unlocked but the lesson hasn't been done yet
    #[default]
    Unlocking,
    Apprentice1,
    Apprentice2,
    Apprentice3,
    Apprentice4,
    Guru1,
    Guru2,
    Master,
    Enlightened,
    Burned,
}

impl SrsStage {
    /// All stages in ladder order
    pub const ALL: [SrsStage; 10] = [
        SrsStage::Unlocking,
        SrsStage::Apprentice1,
        SrsStage::Apprentice2,
        SrsStage::Apprentice3,
        SrsStage::Apprentice4,
        SrsStage::Guru1,
        SrsStage::Guru2,
        SrsStage::Master,
        SrsStage::Enlightened,
        SrsStage::Burned,
    ];

    /// Stage number as used by the API (0..=9)
    pub fn number(&self) -> i32 {
        *self as i32
    }

    /// Stage for an API stage number
    pub fn from_number(number: i32) -> Option<Self> {
        usize::try_from(number)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Move `n` stages up (or down when negative).
    ///
    /// The result is clamped to `Apprentice1..=Burned`; nothing ever advances
    /// back into `Unlocking`.
    pub fn advanced_by(&self, n: i32) -> Self {
        let target = self
            .number()
            .saturating_add(n)
            .clamp(SrsStage::Apprentice1.number(), SrsStage::Burned.number());
        Self::ALL[target as usize]
    }

    /// One stage up
    pub fn next(&self) -> Self {
        self.advanced_by(1)
    }

    /// One stage down
    pub fn previous(&self) -> Self {
        self.advanced_by(-1)
    }

    /// Signed number of stages from `self` to `other`
    pub fn distance_to(&self, other: SrsStage) -> i32 {
        other.number() - self.number()
    }

    /// Display grouping
    pub fn category(&self) -> SrsStageCategory {
        match self {
            SrsStage::Unlocking
            | SrsStage::Apprentice1
            | SrsStage::Apprentice2
            | SrsStage::Apprentice3
            | SrsStage::Apprentice4 => SrsStageCategory::Apprentice,
            SrsStage::Guru1 | SrsStage::Guru2 => SrsStageCategory::Guru,
            SrsStage::Master => SrsStageCategory::Master,
            SrsStage::Enlightened => SrsStageCategory::Enlightened,
            SrsStage::Burned => SrsStageCategory::Burned,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SrsStage::Unlocking => "Lesson",
            SrsStage::Apprentice1 => "Apprentice I",
            SrsStage::Apprentice2 => "Apprentice II",
            SrsStage::Apprentice3 => "Apprentice III",
            SrsStage::Apprentice4 => "Apprentice IV",
            SrsStage::Guru1 => "Guru I",
            SrsStage::Guru2 => "Guru II",
            SrsStage::Master => "Master",
            SrsStage::Enlightened => "Enlightened",
            SrsStage::Burned => "Burned",
        }
    }

    /// Minimum wait from this stage to the next one.
    ///
    /// Only apprentice stages carry a duration here.
    pub fn duration_to_next(&self, accelerated: bool) -> Option<Duration> {
        let table = if accelerated {
            &ACCELERATED_APPRENTICE_HOURS
        } else {
            &APPRENTICE_HOURS
        };
        let index = match self {
            SrsStage::Apprentice1 => 0,
            SrsStage::Apprentice2 => 1,
            SrsStage::Apprentice3 => 2,
            SrsStage::Apprentice4 => 3,
            _ => return None,
        };
        Some(Duration::hours(table[index]))
    }

    /// Sum of the apprentice intervals from this stage up to Guru I.
    ///
    /// Zero for `Unlocking` and for anything at or past Guru I.
    pub fn minimum_time_until_guru(&self, item_level: i32) -> Duration {
        if *self == SrsStage::Unlocking {
            return Duration::zero();
        }

        let accelerated = is_accelerated_level(item_level);
        SrsStage::ALL
            .iter()
            .filter(|stage| **stage >= *self)
            .filter_map(|stage| stage.duration_to_next(accelerated))
            .fold(Duration::zero(), |total, step| total + step)
    }
}

impl TryFrom<i32> for SrsStage {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        SrsStage::from_number(value).ok_or_else(|| format!("invalid SRS stage: {value}"))
    }
}

impl From<SrsStage> for i32 {
    fn from(stage: SrsStage) -> Self {
        stage.number()
    }
}

impl std::fmt::Display for SrsStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================
