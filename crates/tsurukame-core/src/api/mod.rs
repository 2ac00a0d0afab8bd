//! API Module
//!
//! Async client for the WaniKani v2 REST API:
//! - Pluggable HTTP transport (reqwest by default)
//! - Serial and speculative-parallel collection paging
//! - Rate-limit and clock-skew tracking from the `Date` header
//! - Typed wire envelopes and request bodies

mod client;
mod error;
mod paging;
mod rate_limit;
mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    Collection, PendingProgress, SubjectLevels, WaniKaniClient, BACKDATE_THRESHOLD_SECS,
};
pub use error::{ApiError, Result};
pub use paging::{
    dedup_by_key, page_url, paged_query, speculative_parallel_paged_query, FetchProgress,
    PageAccumulator, PageSource,
};
pub use rate_limit::{RateLimitState, RateLimitStatus, RateLimiter, RATE_LIMIT, WINDOW_SECS};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
