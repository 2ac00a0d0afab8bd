//! # Tsurukame Core
//!
//! The non-UI core of a WaniKani client:
//!
//! - **API client**: typed access to the WaniKani v2 REST API over a
//!   pluggable transport (reqwest by default)
//! - **Paging**: serial cursor-following fetches, plus a speculative parallel
//!   fetch that guesses page boundaries for full syncs of large collections
//! - **Rate limiting**: per-minute request accounting and clock-skew
//!   estimation from the server's `Date` header
//! - **Dates**: an ordered set of parsers for every timestamp variant the API
//!   has been seen to emit, with canonical microsecond output
//! - **SRS**: the stage ladder, its categories, and Guru date projection
//! - **Sync**: watermark-based incremental syncs persisted to disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tsurukame_core::prelude::*;
//!
//! let config = ClientConfig::from_env()?;
//! let client = WaniKaniClient::connect(&config)?;
//!
//! let user = client.user(&FetchProgress::new()).await?;
//! println!("{} is on level {}", user.username, user.current_level());
//!
//! let syncer = Syncer::new(&client, CursorStore::new(None)?);
//! let outcome = syncer.sync(SyncMode::Incremental).await?;
//! println!("{} assignments changed", outcome.report.assignments);
//! ```
//!
//! ## Feature Flags
//!
//! - `reqwest-transport` (default): [`ReqwestTransport`], an HTTP transport
//!   built on reqwest with rustls

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod api;
pub mod config;
pub mod date;
pub mod model;
pub mod srs;
pub mod sync;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use api::{
    ApiError, Collection, FetchProgress, HttpRequest, HttpResponse, PendingProgress,
    RateLimitStatus, RateLimiter, SubjectLevels, Transport, WaniKaniClient, RATE_LIMIT,
};
#[cfg(feature = "reqwest-transport")]
pub use api::ReqwestTransport;
pub use config::{ClientConfig, ConfigError};
pub use date::{DateCodec, DateError, DateParser, WaniKaniDate};
pub use model::{
    Gender, LevelProgression, Meaning, Reading, StudyMaterial, Subject, SubjectType, User,
    VoiceActor,
};
pub use srs::{Assignment, SrsStage, SrsStageCategory, GURU_IN_PAST};
pub use sync::{CursorStore, SyncCursor, SyncError, SyncMode, SyncOutcome, SyncReport, Syncer};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        ApiError, Assignment, ClientConfig, Collection, CursorStore, FetchProgress,
        PendingProgress, SrsStage, SrsStageCategory, Subject, SyncMode, Syncer, User,
        WaniKaniClient, WaniKaniDate,
    };

    #[cfg(feature = "reqwest-transport")]
    pub use crate::ReqwestTransport;
}
