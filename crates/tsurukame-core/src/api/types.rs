//! Wire types for the WaniKani v2 API
//!
//! - Response envelopes (`Resource`, `Page`)
//! - Per-resource payloads and their conversion into model records
//! - Request bodies for the write endpoints
//!
//! Timestamps go through [`WaniKaniDate`] so every known variant decodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::WaniKaniDate;
use crate::model::{
    Gender, LevelProgression, Meaning, Reading, StudyMaterial, Subject, SubjectType, User,
    VoiceActor,
};
use crate::srs::{Assignment, SrsStage};

fn utc(date: Option<WaniKaniDate>) -> Option<DateTime<Utc>> {
    date.map(|d| d.date())
}

// ============================================================================
// ENVELOPES
// ============================================================================

/// A single resource: `{ id, object, data_updated_at, data }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resource<D> {
    /// Absent on singleton resources such as `/user`
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub data_updated_at: Option<WaniKaniDate>,
    pub data: D,
}

/// Pagination block of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pages {
    #[serde(default)]
    pub per_page: Option<i64>,
    #[serde(default)]
    pub next_url: Option<String>,
}

/// One page of a collection
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<D> {
    #[serde(default)]
    pub data_updated_at: Option<WaniKaniDate>,
    pub data: Vec<Resource<D>>,
    #[serde(default)]
    pub pages: Option<Pages>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

impl<D> Page<D> {
    /// Cursor for the following page, `None` on the last one
    pub fn next_url(&self) -> Option<&str> {
        self.pages.as_ref().and_then(|p| p.next_url.as_deref())
    }

    /// Number of pages the whole collection spans, at least one
    pub fn page_count(&self) -> i64 {
        let per_page = self.pages.as_ref().and_then(|p| p.per_page).unwrap_or(0);
        let total = self.total_count.unwrap_or(0);
        if per_page <= 0 || total <= 0 {
            return 1;
        }
        total / per_page + i64::from(total % per_page != 0)
    }

    /// Watermark as a UTC timestamp
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        utc(self.data_updated_at)
    }
}

/// Structured body of a 4xx response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    pub code: i64,
}

// ============================================================================
// USER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionData {
    #[serde(default)]
    pub active: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub max_level_granted: i32,
    #[serde(default)]
    pub period_ends_at: Option<WaniKaniDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserData {
    pub username: String,
    pub level: i32,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default)]
    pub started_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub current_vacation_started_at: Option<WaniKaniDate>,
    pub subscription: SubscriptionData,
}

impl UserData {
    pub fn into_user(self) -> User {
        User {
            username: self.username,
            level: self.level,
            profile_url: self.profile_url,
            started_at: utc(self.started_at),
            vacation_started_at: utc(self.current_vacation_started_at),
            subscribed: self.subscription.active,
            max_level_granted_by_subscription: self.subscription.max_level_granted,
            subscription_ends_at: utc(self.subscription.period_ends_at),
        }
    }
}

// ============================================================================
// ASSIGNMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssignmentData {
    pub subject_id: i64,
    pub subject_type: String,
    pub srs_stage: i32,
    #[serde(default)]
    pub unlocked_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub started_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub passed_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub burned_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub available_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub hidden: bool,
}

impl Resource<AssignmentData> {
    /// Convert to a model assignment, with the subject's level looked up by
    /// the caller. `None` for subject types this client doesn't know.
    pub fn into_assignment(self, level: i32) -> Option<Assignment> {
        let (subject_type, is_kana_only_vocab) = SubjectType::from_object(&self.data.subject_type)?;
        let data = self.data;

        // Stage 0 without an unlock date is a locked item
        let srs_stage = if data.srs_stage == 0 && data.unlocked_at.is_none() {
            None
        } else {
            SrsStage::from_number(data.srs_stage)
        };

        Some(Assignment {
            id: self.id.unwrap_or_default(),
            subject_id: data.subject_id,
            subject_type,
            is_kana_only_vocab,
            srs_stage,
            level,
            available_at: utc(data.available_at),
            started_at: utc(data.started_at),
            passed_at: utc(data.passed_at),
            burned_at: utc(data.burned_at),
        })
    }
}

// ============================================================================
// STUDY MATERIALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudyMaterialData {
    pub subject_id: i64,
    #[serde(default)]
    pub meaning_note: Option<String>,
    #[serde(default)]
    pub reading_note: Option<String>,
    #[serde(default)]
    pub meaning_synonyms: Vec<String>,
}

impl Resource<StudyMaterialData> {
    pub fn into_study_material(self) -> StudyMaterial {
        StudyMaterial {
            id: self.id.unwrap_or_default(),
            subject_id: self.data.subject_id,
            meaning_note: self.data.meaning_note,
            reading_note: self.data.reading_note,
            meaning_synonyms: self.data.meaning_synonyms,
        }
    }
}

// ============================================================================
// LEVEL PROGRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelProgressionData {
    pub level: i32,
    pub created_at: WaniKaniDate,
    #[serde(default)]
    pub unlocked_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub started_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub passed_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub completed_at: Option<WaniKaniDate>,
    #[serde(default)]
    pub abandoned_at: Option<WaniKaniDate>,
}

impl Resource<LevelProgressionData> {
    pub fn into_level_progression(self) -> LevelProgression {
        let data = self.data;
        LevelProgression {
            id: self.id.unwrap_or_default(),
            level: data.level,
            created_at: data.created_at.date(),
            unlocked_at: utc(data.unlocked_at),
            started_at: utc(data.started_at),
            passed_at: utc(data.passed_at),
            completed_at: utc(data.completed_at),
            abandoned_at: utc(data.abandoned_at),
        }
    }
}

// ============================================================================
// SUBJECTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeaningData {
    pub meaning: String,
    pub primary: bool,
    #[serde(default = "accepted")]
    pub accepted_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadingData {
    pub reading: String,
    pub primary: bool,
    #[serde(default = "accepted")]
    pub accepted_answer: bool,
    #[serde(default, rename = "type")]
    pub reading_type: Option<String>,
}

fn accepted() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubjectData {
    pub level: i32,
    pub slug: String,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub meanings: Vec<MeaningData>,
    #[serde(default)]
    pub readings: Vec<ReadingData>,
    #[serde(default)]
    pub component_subject_ids: Vec<i64>,
    #[serde(default)]
    pub amalgamation_subject_ids: Vec<i64>,
    #[serde(default)]
    pub meaning_mnemonic: Option<String>,
    #[serde(default)]
    pub reading_mnemonic: Option<String>,
    #[serde(default)]
    pub hidden_at: Option<WaniKaniDate>,
}

impl Resource<SubjectData> {
    /// `None` when the envelope has no id, no object type, or an unknown one
    pub fn into_subject(self) -> Option<Subject> {
        let id = self.id?;
        let (subject_type, is_kana_only_vocab) = SubjectType::from_object(self.object.as_deref()?)?;
        let data = self.data;

        Some(Subject {
            id,
            subject_type,
            is_kana_only_vocab,
            level: data.level,
            slug: data.slug,
            characters: data.characters,
            document_url: data.document_url,
            meanings: data
                .meanings
                .into_iter()
                .map(|m| Meaning {
                    meaning: m.meaning,
                    primary: m.primary,
                    accepted_answer: m.accepted_answer,
                })
                .collect(),
            readings: data
                .readings
                .into_iter()
                .map(|r| Reading {
                    reading: r.reading,
                    primary: r.primary,
                    accepted_answer: r.accepted_answer,
                    reading_type: r.reading_type,
                })
                .collect(),
            component_subject_ids: data.component_subject_ids,
            amalgamation_subject_ids: data.amalgamation_subject_ids,
            meaning_mnemonic: data.meaning_mnemonic,
            reading_mnemonic: data.reading_mnemonic,
        })
    }
}

// ============================================================================
// VOICE ACTORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceActorData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub gender: String,
}

impl Resource<VoiceActorData> {
    pub fn into_voice_actor(self) -> VoiceActor {
        VoiceActor {
            id: self.id.unwrap_or_default(),
            gender: Gender::parse_name(&self.data.gender),
            name: self.data.name,
            description: self.data.description,
        }
    }
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

/// Body of `PUT /assignments/{id}/start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartAssignmentRequest {
    pub started_at: WaniKaniDate,
}

/// Body of `POST /reviews`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReviewRequest {
    pub review: ReviewBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewBody {
    pub assignment_id: i64,
    pub incorrect_meaning_answers: u32,
    pub incorrect_reading_answers: u32,
    /// Only sent for reviews done a while ago; the server stamps fresh ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<WaniKaniDate>,
}

/// Body of `PUT /study_materials/{id}` and `POST /study_materials`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyMaterialRequest {
    pub study_material: StudyMaterialBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyMaterialBody {
    /// Only set when creating a new record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i64>,
    pub meaning_note: Option<String>,
    pub reading_note: Option<String>,
    pub meaning_synonyms: Vec<String>,
}

impl StudyMaterialBody {
    pub fn from_material(material: &StudyMaterial, include_subject: bool) -> Self {
        Self {
            subject_id: include_subject.then_some(material.subject_id),
            meaning_note: material.meaning_note.clone(),
            reading_note: material.reading_note.clone(),
            meaning_synonyms: material.meaning_synonyms.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
