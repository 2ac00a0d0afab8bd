//! Test Data Factory
//!
//! Builds realistic WaniKani resources for seeding the mock server:
//! - subjects of every type, with meanings and readings
//! - assignments at any SRS stage
//! - study materials, level progressions and voice actors
//! - a pre-built account spanning the first two levels

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use tsurukame_core::date;

use crate::harness::{MockRecord, MockState};

/// Factory for mock server resources.
///
/// # Example
///
/// ```rust,ignore
/// let mut state = MockState::default();
/// state.user = TestDataFactory::user("koichi", 2);
/// state.subjects.push(TestDataFactory::kanji(440, 1, "一", "One", "いち"));
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    /// Reference instant every fixture timestamp is relative to
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// `epoch + hours`
    pub fn at(hours: i64) -> DateTime<Utc> {
        Self::epoch() + Duration::hours(hours)
    }

    fn stamp(hours: i64) -> String {
        date::format(&Self::at(hours))
    }

    // ========================================================================
    // USER
    // ========================================================================

    /// A lifetime subscriber at `level`
    pub fn user(username: &str, level: i32) -> Value {
        json!({
            "id": "5a6a5234-a392-4a87-8f3f-33342afe8a42",
            "username": username,
            "level": level,
            "profile_url": format!("https://www.wanikani.com/users/{username}"),
            "started_at": Self::stamp(0),
            "current_vacation_started_at": null,
            "subscription": {
                "active": true,
                "type": "lifetime",
                "max_level_granted": 60,
                "period_ends_at": null
            }
        })
    }

    /// A free account, capped at level 3
    pub fn free_user(username: &str, level: i32) -> Value {
        let mut user = Self::user(username, level);
        user["subscription"] = json!({
            "active": false,
            "type": "free",
            "max_level_granted": 3,
            "period_ends_at": null
        });
        user
    }

    // ========================================================================
    // SUBJECTS
    // ========================================================================

    pub fn radical(id: i64, level: i32, characters: &str, meaning: &str) -> MockRecord {
        MockRecord::new(
            id,
            "radical",
            Self::at(0),
            json!({
                "level": level,
                "slug": meaning.to_lowercase(),
                "characters": characters,
                "document_url": format!("https://www.wanikani.com/radicals/{}", meaning.to_lowercase()),
                "meanings": [{"meaning": meaning, "primary": true, "accepted_answer": true}],
                "amalgamation_subject_ids": [],
                "meaning_mnemonic": format!("This is the {meaning} radical."),
                "hidden_at": null
            }),
        )
    }

    pub fn kanji(id: i64, level: i32, characters: &str, meaning: &str, reading: &str) -> MockRecord {
        MockRecord::new(
            id,
            "kanji",
            Self::at(0),
            json!({
                "level": level,
                "slug": characters,
                "characters": characters,
                "document_url": format!("https://www.wanikani.com/kanji/{characters}"),
                "meanings": [{"meaning": meaning, "primary": true, "accepted_answer": true}],
                "readings": [{"reading": reading, "primary": true, "accepted_answer": true, "type": "onyomi"}],
                "component_subject_ids": [],
                "amalgamation_subject_ids": [],
                "meaning_mnemonic": format!("Remember {meaning}."),
                "reading_mnemonic": format!("Read it {reading}."),
                "hidden_at": null
            }),
        )
    }

    pub fn vocabulary(
        id: i64,
        level: i32,
        characters: &str,
        meaning: &str,
        reading: &str,
    ) -> MockRecord {
        MockRecord::new(
            id,
            "vocabulary",
            Self::at(0),
            json!({
                "level": level,
                "slug": characters,
                "characters": characters,
                "meanings": [{"meaning": meaning, "primary": true, "accepted_answer": true}],
                "readings": [{"reading": reading, "primary": true, "accepted_answer": true}],
                "component_subject_ids": [],
                "hidden_at": null
            }),
        )
    }

    pub fn kana_vocabulary(id: i64, level: i32, characters: &str, meaning: &str) -> MockRecord {
        MockRecord::new(
            id,
            "kana_vocabulary",
            Self::at(0),
            json!({
                "level": level,
                "slug": characters,
                "characters": characters,
                "meanings": [{"meaning": meaning, "primary": true, "accepted_answer": true}],
                "hidden_at": null
            }),
        )
    }

    /// `count` kanji with ids `first_id..`, all on `level`
    pub fn kanji_batch(first_id: i64, count: usize, level: i32) -> Vec<MockRecord> {
        (0..count as i64)
            .map(|i| {
                let id = first_id + i;
                Self::kanji(id, level, &format!("字{id}"), &format!("Kanji {id}"), "じ")
            })
            .collect()
    }

    // ========================================================================
    // ASSIGNMENTS
    // ========================================================================

    /// An unlocked assignment at `srs_stage`, started unless it is a lesson
    pub fn assignment(id: i64, subject: &MockRecord, srs_stage: i32) -> MockRecord {
        let started = srs_stage > 0;
        MockRecord::new(
            id,
            "assignment",
            Self::at(1),
            json!({
                "subject_id": subject.id,
                "subject_type": subject.object,
                "srs_stage": srs_stage,
                "unlocked_at": Self::stamp(1),
                "started_at": if started { Some(Self::stamp(2)) } else { None },
                "passed_at": if srs_stage >= 5 { Some(Self::stamp(100)) } else { None },
                "burned_at": if srs_stage >= 9 { Some(Self::stamp(4000)) } else { None },
                "available_at": if started && srs_stage < 9 { Some(Self::stamp(200)) } else { None },
                "hidden": false
            }),
        )
    }

    /// An assignment the user hasn't unlocked yet
    pub fn locked_assignment(id: i64, subject: &MockRecord) -> MockRecord {
        let mut record = Self::assignment(id, subject, 0);
        record.data["unlocked_at"] = Value::Null;
        record
    }

    // ========================================================================
    // OTHER RESOURCES
    // ========================================================================

    pub fn study_material(id: i64, subject_id: i64, meaning_note: &str, synonyms: &[&str]) -> MockRecord {
        MockRecord::new(
            id,
            "study_material",
            Self::at(3),
            json!({
                "subject_id": subject_id,
                "meaning_note": meaning_note,
                "reading_note": null,
                "meaning_synonyms": synonyms,
                "hidden": false
            }),
        )
    }

    /// Progression through `level`, passed one week after unlocking if `passed`
    pub fn level_progression(id: i64, level: i32, passed: bool) -> MockRecord {
        let unlocked = i64::from(level - 1) * 24 * 7;
        MockRecord::new(
            id,
            "level_progression",
            Self::at(unlocked),
            json!({
                "level": level,
                "created_at": Self::stamp(unlocked),
                "unlocked_at": Self::stamp(unlocked),
                "started_at": Self::stamp(unlocked + 1),
                "passed_at": if passed { Some(Self::stamp(unlocked + 24 * 7)) } else { None },
                "completed_at": null,
                "abandoned_at": null
            }),
        )
    }

    pub fn voice_actor(id: i64, name: &str, gender: &str) -> MockRecord {
        MockRecord::new(
            id,
            "voice_actor",
            Self::at(0),
            json!({
                "name": name,
                "gender": gender,
                "description": format!("{name} from Tokyo")
            }),
        )
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// A level 2 account: level 1 passed, a mix of stages across every
    /// subject type, one locked item, one note and two voice actors.
    ///
    /// Subjects have ids 1..=8, assignments 101..=108.
    pub fn two_level_account() -> MockState {
        let subjects = vec![
            Self::radical(1, 1, "一", "Ground"),
            Self::radical(2, 1, "丨", "Stick"),
            Self::kanji(3, 1, "一", "One", "いち"),
            Self::kanji(4, 1, "二", "Two", "に"),
            Self::vocabulary(5, 1, "一つ", "One Thing", "ひとつ"),
            Self::kana_vocabulary(6, 2, "ありがとう", "Thank You"),
            Self::kanji(7, 2, "力", "Power", "りょく"),
            Self::vocabulary(8, 2, "力", "Power", "ちから"),
        ];

        let assignments = vec![
            Self::assignment(101, &subjects[0], 9),
            Self::assignment(102, &subjects[1], 5),
            Self::assignment(103, &subjects[2], 4),
            Self::assignment(104, &subjects[3], 2),
            Self::assignment(105, &subjects[4], 1),
            Self::assignment(106, &subjects[5], 0),
            Self::assignment(107, &subjects[6], 7),
            Self::locked_assignment(108, &subjects[7]),
        ];

        MockState {
            user: Self::user("koichi", 2),
            subjects,
            assignments,
            study_materials: vec![Self::study_material(201, 3, "Just one line", &["single"])],
            level_progressions: vec![
                Self::level_progression(301, 1, true),
                Self::level_progression(302, 2, false),
            ],
            voice_actors: vec![
                Self::voice_actor(401, "Kyoko", "female"),
                Self::voice_actor(402, "Kenichi", "male"),
            ],
            ..MockState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_account_shape() {
        let state = TestDataFactory::two_level_account();
        assert_eq!(state.subjects.len(), 8);
        assert_eq!(state.assignments.len(), 8);
        assert!(state
            .assignments
            .iter()
            .all(|a| state.subjects.iter().any(|s| Some(s.id) == a.data["subject_id"].as_i64())));
        assert!(state.assignments[7].data["unlocked_at"].is_null());
    }

    #[test]
    fn test_kanji_batch_ids() {
        let batch = TestDataFactory::kanji_batch(10, 3, 5);
        let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(batch[0].data["level"], 5);
    }
}
