//! WaniKani API client
//!
//! One method per endpoint. Every request goes through a single send path,
//! which:
//! - attaches the `Authorization` header
//! - feeds the response `Date` header into the shared [`RateLimiter`]
//! - maps status codes onto [`ApiError`]
//!
//! Collection endpoints return a [`Collection`] whose watermark can be passed
//! back as `updated_after` on the next incremental fetch.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::hash::BuildHasher;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};
use url::Url;

use super::error::{ApiError, Result};
use super::paging::{
    dedup_by_key, paged_query, speculative_parallel_paged_query, FetchProgress, PageAccumulator,
    PageSource,
};
use super::rate_limit::RateLimiter;
use super::transport::{HttpRequest, Method, Transport};
use super::types::{
    AssignmentData, CreateReviewRequest, ErrorResponse, LevelProgressionData, Page, Resource,
    ReviewBody, StartAssignmentRequest, StudyMaterialBody, StudyMaterialData, StudyMaterialRequest,
    SubjectData, UserData, VoiceActorData,
};
use crate::config::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_SPECULATIVE_PAGES, DEFAULT_SPECULATIVE_PER_PAGE,
};
use crate::date::{self, WaniKaniDate};
use crate::model::{LevelProgression, StudyMaterial, Subject, User, VoiceActor};
use crate::srs::Assignment;

/// Reviews older than this are sent with their own `created_at`
pub const BACKDATE_THRESHOLD_SECS: i64 = 15 * 60;

// ============================================================================
// SUPPORTING TYPES
// ============================================================================

/// Items of one collection fetch plus the watermark to resume from
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    /// Server watermark, or the `updated_after` the fetch started from
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Collection<T> {
    fn from_accumulator<D>(
        accumulator: PageAccumulator<Resource<D>>,
        updated_after: Option<DateTime<Utc>>,
        convert: impl FnMut(Resource<D>) -> Option<T>,
    ) -> Self {
        Self {
            items: accumulator.items.into_iter().filter_map(convert).collect(),
            updated_at: accumulator.updated_at.or(updated_after),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Looks up a subject's level, which assignments don't carry themselves
pub trait SubjectLevels {
    fn level_of(&self, subject_id: i64) -> Option<i32>;
}

impl<S: BuildHasher> SubjectLevels for HashMap<i64, i32, S> {
    fn level_of(&self, subject_id: i64) -> Option<i32> {
        self.get(&subject_id).copied()
    }
}

impl SubjectLevels for BTreeMap<i64, i32> {
    fn level_of(&self, subject_id: i64) -> Option<i32> {
        self.get(&subject_id).copied()
    }
}

/// A finished lesson or review waiting to be reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProgress {
    pub assignment_id: i64,
    /// Lessons start the assignment; reviews create a review record
    pub is_lesson: bool,
    pub meaning_wrong_count: u32,
    pub reading_wrong_count: u32,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Client for the WaniKani v2 API
#[derive(Debug)]
pub struct WaniKaniClient<T> {
    transport: T,
    base_url: Url,
    api_token: RwLock<String>,
    rate_limiter: Arc<RateLimiter>,
    speculative_pages: u32,
    speculative_per_page: u32,
}

impl<T: Transport> WaniKaniClient<T> {
    /// Client for the public API
    pub fn new(transport: T, api_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            api_token: RwLock::new(api_token.into()),
            rate_limiter: Arc::new(RateLimiter::new()),
            speculative_pages: DEFAULT_SPECULATIVE_PAGES,
            speculative_per_page: DEFAULT_SPECULATIVE_PER_PAGE,
        })
    }

    /// Client built from a configuration; the token must be set
    pub fn from_config(transport: T, config: &ClientConfig) -> crate::config::Result<Self> {
        let token = config.require_token()?;
        Ok(Self::new(transport, token)?
            .with_base_url(config.base_url()?)
            .with_speculative_fetch(config.speculative_pages, config.speculative_per_page))
    }

    /// Point at another server (a mirror or a test double)
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Share a rate limiter with other clients or observers
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Tune the speculative subject fetch
    pub fn with_speculative_fetch(mut self, pages: u32, per_page: u32) -> Self {
        self.speculative_pages = pages.max(1);
        self.speculative_per_page = per_page.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Replace the token used for subsequent requests
    pub fn update_api_token(&self, api_token: impl Into<String>) {
        *self.api_token.write().unwrap_or_else(PoisonError::into_inner) = api_token.into();
    }

    fn api_token(&self) -> String {
        self.api_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn collection_url(
        &self,
        path: &str,
        params: &[(&str, &str)],
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        let mut pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(date) = updated_after {
            pairs.push(("updated_after".to_string(), date::format(&date)));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    // ========================================================================
    // REQUEST PATH
    // ========================================================================

    /// Send one request and decode the body as `R`
    async fn send<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R> {
        let url = request.url.to_string();
        debug!("{} {}", request.method, url);

        let request =
            request.with_header("Authorization", format!("Token token={}", self.api_token()));

        let started = Instant::now();
        let response = self.transport.execute(request).await?;
        let rtt = Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());
        self.rate_limiter
            .observe_header(response.header("Date"), rtt, Utc::now());

        match response.status {
            200 | 201 => match serde_json::from_slice(&response.body) {
                Ok(value) => Ok(value),
                Err(source) => Err(ApiError::Decode {
                    url,
                    body: response.body,
                    source,
                }),
            },
            status @ 400..=499 => match serde_json::from_slice::<ErrorResponse>(&response.body) {
                Ok(error) => Err(ApiError::Api {
                    status,
                    code: error.code,
                    message: error.error,
                    url,
                }),
                Err(source) => Err(ApiError::Decode {
                    url,
                    body: response.body,
                    source,
                }),
            },
            status => Err(ApiError::Status { status, url }),
        }
    }

    async fn collection<D, M>(
        &self,
        url: Url,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
        convert: impl FnMut(Resource<D>) -> Option<M>,
    ) -> Result<Collection<M>>
    where
        D: DeserializeOwned + Send,
    {
        let accumulator = paged_query::<Self, D>(self, url, progress).await?;
        Ok(Collection::from_accumulator(accumulator, updated_after, convert))
    }

    // ========================================================================
    // READ ENDPOINTS
    // ========================================================================

    /// The authenticated user
    pub async fn user(&self, progress: &FetchProgress) -> Result<User> {
        progress.set_total_unit_count(1);
        let resource: Resource<UserData> = self.send(HttpRequest::get(self.endpoint("user")?)).await?;
        progress.set_completed_unit_count(1);
        Ok(resource.data.into_user())
    }

    /// Unlocked, non-hidden assignments changed since `updated_after`
    pub async fn assignments(
        &self,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
        levels: &(impl SubjectLevels + Sync),
    ) -> Result<Collection<Assignment>> {
        let url = self.collection_url(
            "assignments",
            &[("unlocked", "true"), ("hidden", "false")],
            updated_after,
        )?;

        self.collection(url, progress, updated_after, |resource: Resource<AssignmentData>| {
            let subject_id = resource.data.subject_id;
            let subject_type = resource.data.subject_type.clone();
            let level = levels.level_of(subject_id).unwrap_or_else(|| {
                debug!("No level known for subject {}", subject_id);
                0
            });
            let assignment = resource.into_assignment(level);
            if assignment.is_none() {
                warn!(
                    "Skipping assignment for subject {} with unknown type {}",
                    subject_id, subject_type
                );
            }
            assignment
        })
        .await
    }

    /// Study materials changed since `updated_after`
    pub async fn study_materials(
        &self,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Collection<StudyMaterial>> {
        let url = self.collection_url("study_materials", &[], updated_after)?;
        self.collection(url, progress, updated_after, |resource: Resource<StudyMaterialData>| {
            Some(resource.into_study_material())
        })
        .await
    }

    /// The study material for one subject, if the user created one
    pub async fn study_material(&self, subject_id: i64) -> Result<Option<StudyMaterial>> {
        let subject_ids = subject_id.to_string();
        let url = self.collection_url("study_materials", &[("subject_ids", &subject_ids)], None)?;
        let page: Page<StudyMaterialData> = self.send(HttpRequest::get(url)).await?;
        Ok(page
            .data
            .into_iter()
            .next()
            .map(Resource::into_study_material))
    }

    /// Level progressions changed since `updated_after`
    pub async fn level_progressions(
        &self,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Collection<LevelProgression>> {
        let url = self.collection_url("level_progressions", &[], updated_after)?;
        self.collection(url, progress, updated_after, |resource: Resource<LevelProgressionData>| {
            Some(resource.into_level_progression())
        })
        .await
    }

    /// Non-hidden subjects changed since `updated_after`.
    ///
    /// Without a watermark the whole catalogue is needed, so the pages are
    /// fetched speculatively in parallel.
    pub async fn subjects(
        &self,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Collection<Subject>> {
        let url = self.collection_url("subjects", &[("hidden", "false")], updated_after)?;

        let mut accumulator = match updated_after {
            None => {
                speculative_parallel_paged_query::<Self, SubjectData>(
                    self,
                    &url,
                    self.speculative_per_page,
                    self.speculative_pages,
                    progress,
                )
                .await?
            }
            Some(_) => paged_query::<Self, SubjectData>(self, url, progress).await?,
        };
        accumulator.items = dedup_by_key(accumulator.items, |resource| resource.id);

        Ok(Collection::from_accumulator(accumulator, updated_after, |resource: Resource<SubjectData>| {
            let id = resource.id;
            let subject = resource.into_subject();
            if subject.is_none() {
                warn!("Skipping subject {:?} without id or known type", id);
            }
            subject
        }))
    }

    /// Voice actors changed since `updated_after`
    pub async fn voice_actors(
        &self,
        progress: &FetchProgress,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Collection<VoiceActor>> {
        let url = self.collection_url("voice_actors", &[], updated_after)?;
        self.collection(url, progress, updated_after, |resource: Resource<VoiceActorData>| {
            Some(resource.into_voice_actor())
        })
        .await
    }

    // ========================================================================
    // WRITE ENDPOINTS
    // ========================================================================

    /// Report a finished lesson or review
    pub async fn send_progress(&self, progress: &PendingProgress) -> Result<()> {
        self.send_progress_at(progress, Utc::now()).await
    }

    /// [`send_progress`](Self::send_progress) with an explicit current time
    pub async fn send_progress_at(&self, progress: &PendingProgress, now: DateTime<Utc>) -> Result<()> {
        let request = if progress.is_lesson {
            let url = self.endpoint(&format!("assignments/{}/start", progress.assignment_id))?;
            let body = StartAssignmentRequest {
                started_at: WaniKaniDate::new(progress.created_at),
            };
            HttpRequest::json(Method::Put, url, &body)?
        } else {
            let backdated =
                now - progress.created_at > Duration::seconds(BACKDATE_THRESHOLD_SECS);
            let body = CreateReviewRequest {
                review: ReviewBody {
                    assignment_id: progress.assignment_id,
                    incorrect_meaning_answers: progress.meaning_wrong_count,
                    incorrect_reading_answers: progress.reading_wrong_count,
                    created_at: backdated.then(|| WaniKaniDate::new(progress.created_at)),
                },
            };
            HttpRequest::json(Method::Post, self.endpoint("reviews")?, &body)?
        };

        let _: IgnoredAny = self.send(request).await?;
        Ok(())
    }

    /// Create or update the user's notes and synonyms for a subject.
    ///
    /// Returns the record as stored by the server.
    pub async fn update_study_material(&self, material: &StudyMaterial) -> Result<StudyMaterial> {
        let request = match self.study_material(material.subject_id).await? {
            Some(existing) => {
                let url = self.endpoint(&format!("study_materials/{}", existing.id))?;
                let body = StudyMaterialRequest {
                    study_material: StudyMaterialBody::from_material(material, false),
                };
                HttpRequest::json(Method::Put, url, &body)?
            }
            None => {
                let body = StudyMaterialRequest {
                    study_material: StudyMaterialBody::from_material(material, true),
                };
                HttpRequest::json(Method::Post, self.endpoint("study_materials")?, &body)?
            }
        };

        let resource: Resource<StudyMaterialData> = self.send(request).await?;
        Ok(resource.into_study_material())
    }
}

impl<T: Transport> PageSource for WaniKaniClient<T> {
    fn fetch_page<D>(&self, url: Url) -> impl Future<Output = Result<Page<D>>> + Send
    where
        D: DeserializeOwned + Send,
    {
        self.send(HttpRequest::get(url))
    }
}

#[cfg(feature = "reqwest-transport")]
impl WaniKaniClient<super::transport::ReqwestTransport> {
    /// Client over reqwest, configured from `config`
    pub fn connect(config: &ClientConfig) -> crate::config::Result<Self> {
        let transport = super::transport::ReqwestTransport::new(config.timeout, &config.user_agent)?;
        Self::from_config(transport, config)
    }
}

// ============================================================================
// TESTS
// ============================================================================
