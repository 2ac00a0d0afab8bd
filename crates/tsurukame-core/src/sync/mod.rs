//! Sync Module
//!
//! Pulls every collection the client tracks and remembers where it left off:
//! - One watermark per collection, passed back as `updated_after`
//! - The subject level map that assignments are resolved against
//! - Full syncs start from an empty cursor (and so fetch subjects
//!   speculatively); incremental syncs resume from the stored one
//!
//! The cursor is only written after every collection was fetched, so a
//! failed sync is simply retried from the previous state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{ApiError, FetchProgress, RateLimitStatus, Transport, WaniKaniClient};
use crate::model::{LevelProgression, StudyMaterial, Subject, VoiceActor};
use crate::srs::Assignment;

/// File name of the cursor inside the data directory
pub const CURSOR_FILE_NAME: &str = "sync-cursor.json";

// ============================================================================
// ERRORS
// ============================================================================

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cursor file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Initialization error: {0}")]
    Init(String),
}

// ============================================================================
// CURSOR
// ============================================================================

/// Where the last successful sync left off
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCursor {
    #[serde(default)]
    pub subjects_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignments_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub study_materials_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub level_progressions_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voice_actors_updated_at: Option<DateTime<Utc>>,
    /// Level of every subject seen so far
    #[serde(default)]
    pub subject_levels: BTreeMap<i64, i32>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// JSON file holding a [`SyncCursor`]
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    /// Store at `path`, or in the platform data directory when `None`
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "tsurukame", "tsurukame").ok_or_else(|| {
                    SyncError::Init("Could not determine project directories".to_string())
                })?;
                proj_dirs.data_dir().join(CURSOR_FILE_NAME)
            }
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored cursor, or an empty one if nothing was saved yet
    pub fn load(&self) -> Result<SyncCursor> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cursor at {}, starting fresh", self.path.display());
                Ok(SyncCursor::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the cursor, replacing the previous one atomically
    pub fn save(&self, cursor: &SyncCursor) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(cursor)?)?;

        // Contains nothing secret, but no reason for others to read it
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Forget the stored cursor
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// SYNC
// ============================================================================

/// Whether to resume from the stored cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Refetch everything
    Full,
    /// Only what changed since the last sync
    Incremental,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counts and status of one finished sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub mode: SyncMode,
    pub subjects: usize,
    pub assignments: usize,
    pub study_materials: usize,
    pub level_progressions: usize,
    pub voice_actors: usize,
    pub rate_limit: RateLimitStatus,
    pub finished_at: DateTime<Utc>,
}

/// Everything fetched by one sync
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub report: SyncReport,
    pub cursor: SyncCursor,
    pub subjects: Vec<Subject>,
    pub assignments: Vec<Assignment>,
    pub study_materials: Vec<StudyMaterial>,
    pub level_progressions: Vec<LevelProgression>,
    pub voice_actors: Vec<VoiceActor>,
}

/// Drives a client through one sync and persists the cursor
pub struct Syncer<'a, T> {
    client: &'a WaniKaniClient<T>,
    store: CursorStore,
}

impl<'a, T: Transport> Syncer<'a, T> {
    pub fn new(client: &'a WaniKaniClient<T>, store: CursorStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &CursorStore {
        &self.store
    }

    /// Fetch subjects, assignments, study materials, level progressions and
    /// voice actors, then advance the cursor.
    pub async fn sync(&self, mode: SyncMode) -> Result<SyncOutcome> {
        let previous = match mode {
            SyncMode::Full => SyncCursor::default(),
            SyncMode::Incremental => self.store.load()?,
        };
        info!("Starting {} sync", mode);

        let subjects = self
            .client
            .subjects(&FetchProgress::new(), previous.subjects_updated_at)
            .await?;
        debug!("Fetched {} subjects", subjects.len());

        let mut subject_levels = previous.subject_levels.clone();
        subject_levels.extend(subjects.items.iter().map(|s| (s.id, s.level)));

        let assignments = self
            .client
            .assignments(
                &FetchProgress::new(),
                previous.assignments_updated_at,
                &subject_levels,
            )
            .await?;
        debug!("Fetched {} assignments", assignments.len());

        let study_materials = self
            .client
            .study_materials(&FetchProgress::new(), previous.study_materials_updated_at)
            .await?;

        let level_progressions = self
            .client
            .level_progressions(&FetchProgress::new(), previous.level_progressions_updated_at)
            .await?;

        let voice_actors = self
            .client
            .voice_actors(&FetchProgress::new(), previous.voice_actors_updated_at)
            .await?;

        let finished_at = Utc::now();
        let cursor = SyncCursor {
            subjects_updated_at: subjects.updated_at,
            assignments_updated_at: assignments.updated_at,
            study_materials_updated_at: study_materials.updated_at,
            level_progressions_updated_at: level_progressions.updated_at,
            voice_actors_updated_at: voice_actors.updated_at,
            subject_levels,
            last_synced_at: Some(finished_at),
        };
        self.store.save(&cursor)?;

        let report = SyncReport {
            mode,
            subjects: subjects.len(),
            assignments: assignments.len(),
            study_materials: study_materials.len(),
            level_progressions: level_progressions.len(),
            voice_actors: voice_actors.len(),
            rate_limit: self.client.rate_limiter().status(finished_at),
            finished_at,
        };
        info!(
            "Sync complete: {} subjects, {} assignments, {} study materials, {} level progressions, {} voice actors",
            report.subjects,
            report.assignments,
            report.study_materials,
            report.level_progressions,
            report.voice_actors
        );

        Ok(SyncOutcome {
            report,
            cursor,
            subjects: subjects.items,
            assignments: assignments.items,
            study_materials: study_materials.items,
            level_progressions: level_progressions.items,
            voice_actors: voice_actors.items,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
