//! Subjects and the records attached to them

use serde::{Deserialize, Serialize};

// ============================================================================
// SUBJECT TYPE
// ============================================================================

/// Kind of study content
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Radical,
    Kanji,
    Vocabulary,
}

impl SubjectType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Radical => "radical",
            SubjectType::Kanji => "kanji",
            SubjectType::Vocabulary => "vocabulary",
        }
    }

    /// Map an API object type.
    ///
    /// Returns the type plus whether it was kana-only vocabulary.
    pub fn from_object(object: &str) -> Option<(Self, bool)> {
        match object {
            "radical" => Some((SubjectType::Radical, false)),
            "kanji" => Some((SubjectType::Kanji, false)),
            "vocabulary" => Some((SubjectType::Vocabulary, false)),
            "kana_vocabulary" => Some((SubjectType::Vocabulary, true)),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SUBJECT
// ============================================================================

/// One accepted meaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub meaning: String,
    pub primary: bool,
    pub accepted_answer: bool,
}

/// One reading (kanji and vocabulary only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub reading: String,
    pub primary: bool,
    pub accepted_answer: bool,
    /// onyomi / kunyomi / nanori for kanji, absent for vocabulary
    pub reading_type: Option<String>,
}

/// A radical, kanji or vocabulary item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub subject_type: SubjectType,
    pub is_kana_only_vocab: bool,
    pub level: i32,
    pub slug: String,
    /// Radicals without a unicode character have no characters
    pub characters: Option<String>,
    pub document_url: Option<String>,
    pub meanings: Vec<Meaning>,
    pub readings: Vec<Reading>,
    pub component_subject_ids: Vec<i64>,
    pub amalgamation_subject_ids: Vec<i64>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
}

impl Subject {
    /// The primary meaning, if any
    pub fn primary_meaning(&self) -> Option<&str> {
        self.meanings
            .iter()
            .find(|m| m.primary)
            .map(|m| m.meaning.as_str())
    }

    /// The primary reading, if any
    pub fn primary_reading(&self) -> Option<&str> {
        self.readings
            .iter()
            .find(|r| r.primary)
            .map(|r| r.reading.as_str())
    }

    /// Characters, falling back to the slug for image-only radicals
    pub fn japanese(&self) -> &str {
        self.characters.as_deref().unwrap_or(&self.slug)
    }
}

// ============================================================================
// STUDY MATERIALS / VOICE ACTORS
// ============================================================================

/// User-authored notes and synonyms for a subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    /// Record id (0 when not yet created on the server)
    pub id: i64,
    pub subject_id: i64,
    pub meaning_note: Option<String>,
    pub reading_note: Option<String>,
    pub meaning_synonyms: Vec<String>,
}

/// Voice actor gender as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Voice actor for vocabulary audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceActor {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub gender: Gender,
}
