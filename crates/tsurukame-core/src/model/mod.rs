//! Domain records decoded from the API
//!
//! Plain data with `DateTime<Utc>` timestamps; the wire envelopes that carry
//! them live in [`crate::api::types`].

mod subject;
mod user;

pub use subject::{Gender, Meaning, Reading, StudyMaterial, Subject, SubjectType, VoiceActor};
pub use user::{LevelProgression, User};
