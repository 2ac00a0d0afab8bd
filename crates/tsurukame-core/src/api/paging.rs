//! Collection fetching
//!
//! Two strategies over the same page source:
//! - [`paged_query`] follows `pages.next_url` one page at a time
//! - [`speculative_parallel_paged_query`] guesses page boundaries from
//!   `page_after_id` and fetches several pages at once, for full syncs of
//!   large collections
//!
//! Both report through a shared [`FetchProgress`] and abort on the first
//! error without returning partial results.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use futures::future::{try_join, try_join_all};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::error::Result;
use super::types::{Page, Resource};

// ============================================================================
// PROGRESS
// ============================================================================

/// Unit-count progress of one fetch.
///
/// `total_unit_count` is -1 until the first page says how many pages there
/// are. Safe to read from another thread while a fetch is running.
#[derive(Debug)]
pub struct FetchProgress {
    total: AtomicI64,
    completed: AtomicI64,
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self {
            total: AtomicI64::new(-1),
            completed: AtomicI64::new(0),
        }
    }
}

impl FetchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_unit_count(&self) -> i64 {
        self.total.load(Ordering::Acquire)
    }

    pub fn completed_unit_count(&self) -> i64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn set_total_unit_count(&self, total: i64) {
        self.total.store(total, Ordering::Release);
    }

    pub fn set_completed_unit_count(&self, completed: i64) {
        self.completed.store(completed, Ordering::Release);
    }

    pub fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    /// No page has been seen yet
    pub fn is_indeterminate(&self) -> bool {
        self.total_unit_count() < 0
    }

    /// Completed fraction in `[0, 1]`, `None` while indeterminate
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total_unit_count();
        if total <= 0 {
            return None;
        }
        Some((self.completed_unit_count() as f64 / total as f64).clamp(0.0, 1.0))
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Items gathered so far plus the most recent watermark
#[derive(Debug, Clone, PartialEq)]
pub struct PageAccumulator<T> {
    pub items: Vec<T>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for PageAccumulator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            updated_at: None,
        }
    }
}

impl<T> PageAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page. A page without a watermark keeps the previous one.
    pub fn merge(&mut self, items: impl IntoIterator<Item = T>, updated_at: Option<DateTime<Utc>>) {
        self.items.extend(items);
        if updated_at.is_some() {
            self.updated_at = updated_at;
        }
    }

    /// Append everything another accumulator gathered
    pub fn absorb(&mut self, other: PageAccumulator<T>) {
        self.merge(other.items, other.updated_at);
    }
}

impl<D> PageAccumulator<Resource<D>> {
    fn merge_page(&mut self, page: Page<D>) {
        let updated_at = page.updated_at();
        self.merge(page.data, updated_at);
    }
}

/// Collapse items sharing a key.
///
/// The last occurrence wins and takes the position of the first one.
/// Items without a key are kept as they are.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> Option<K>,
{
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(items.len());

    for item in items {
        match key(&item) {
            Some(k) => {
                if let Some(&index) = positions.get(&k) {
                    kept[index] = item;
                } else {
                    positions.insert(k, kept.len());
                    kept.push(item);
                }
            }
            None => kept.push(item),
        }
    }

    kept
}

// ============================================================================
// PAGE SOURCE
// ============================================================================

/// Anything that can fetch and decode one collection page
pub trait PageSource: Sync {
    fn fetch_page<D>(&self, url: Url) -> impl Future<Output = Result<Page<D>>> + Send
    where
        D: DeserializeOwned + Send;
}

/// `base` with `page_after_id` appended to its query
pub fn page_url(base: &Url, page_after_id: i64) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("page_after_id", &page_after_id.to_string());
    url
}

// ============================================================================
// SERIAL PAGING
// ============================================================================

/// Fetch every page of a collection in cursor order.
///
/// On the first page the progress total becomes the page count reported by
/// the server and one unit is marked complete; each later page completes
/// one more unit. The progress total is only set if still indeterminate.
pub async fn paged_query<S, D>(
    source: &S,
    url: Url,
    progress: &FetchProgress,
) -> Result<PageAccumulator<Resource<D>>>
where
    S: PageSource,
    D: DeserializeOwned + Send,
{
    let mut accumulator = PageAccumulator::new();
    let mut next = Some(url);

    while let Some(url) = next.take() {
        let page: Page<D> = source.fetch_page(url).await?;

        if progress.is_indeterminate() {
            progress.set_total_unit_count(page.page_count());
            progress.set_completed_unit_count(1);
        } else {
            progress.increment_completed();
        }

        next = page.next_url().map(Url::parse).transpose()?;
        debug!(
            "Fetched page with {} items ({}/{})",
            page.data.len(),
            progress.completed_unit_count(),
            progress.total_unit_count()
        );
        accumulator.merge_page(page);
    }

    Ok(accumulator)
}

// ============================================================================
// SPECULATIVE PARALLEL PAGING
// ============================================================================

/// Fetch a large collection by guessing its page boundaries.
///
/// Page `i` is requested with `page_after_id = i * per_page - 1`, so the
/// guesses only line up for collections with dense ids starting near zero.
/// The first `num_pages - 1` pages are fetched once; the last one is
/// followed serially through any further cursors to pick up whatever the
/// guesses missed. Pages are merged in index order, serial tail last, and
/// duplicates are collapsed by resource id.
pub async fn speculative_parallel_paged_query<S, D>(
    source: &S,
    base: &Url,
    per_page: u32,
    num_pages: u32,
    progress: &FetchProgress,
) -> Result<PageAccumulator<Resource<D>>>
where
    S: PageSource,
    D: DeserializeOwned + Send,
{
    let num_pages = num_pages.max(1);
    let per_page = i64::from(per_page);
    let last_page = i64::from(num_pages - 1);

    progress.set_total_unit_count(1);
    progress.set_completed_unit_count(0);

    debug!("Speculatively fetching {} pages of {} from {}", num_pages, per_page, base);

    let heads = (0..last_page).map(|page| source.fetch_page::<D>(page_url(base, page * per_page - 1)));

    // The tail reports into its own progress; the caller only sees 0 or 1
    let tail_progress = FetchProgress::new();
    let tail = paged_query::<S, D>(source, page_url(base, last_page * per_page - 1), &tail_progress);

    let (heads, tail) = try_join(try_join_all(heads), tail).await?;

    let mut accumulator = PageAccumulator::new();
    for page in heads {
        accumulator.merge_page(page);
    }
    accumulator.absorb(tail);
    accumulator.items = dedup_by_key(accumulator.items, |resource| resource.id);

    progress.set_completed_unit_count(1);
    Ok(accumulator)
}

// ============================================================================
// TESTS
// ============================================================================
