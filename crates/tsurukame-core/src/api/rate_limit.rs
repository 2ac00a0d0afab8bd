//! Rate-limit and clock-skew estimation
//!
//! WaniKani allows a fixed number of requests per server-clock minute. The
//! only signal we get is the `Date` header of each response, so the limiter:
//! - counts responses whose server timestamp falls in the same minute
//! - estimates the offset between the server clock and ours
//! - projects when the current window ends in local time
//!
//! This is a best-effort heuristic: the header has one-second resolution and
//! the skew estimate assumes symmetric latency.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date::parse_http_date;

/// Requests allowed per server minute
pub const RATE_LIMIT: u32 = 60;

/// Length of one rate-limit window, in seconds
pub const WINDOW_SECS: i64 = 60;

fn window() -> Duration {
    Duration::seconds(WINDOW_SECS)
}

/// Raw estimator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Server timestamp of the most recent response
    pub last_request_server_date: Option<DateTime<Utc>>,
    /// Responses seen in that server minute
    pub requests_in_interval: u32,
    /// Estimated `server clock - local clock`
    pub clock_skew: Duration,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            last_request_server_date: None,
            requests_in_interval: 0,
            clock_skew: Duration::zero(),
        }
    }
}

/// Point-in-time summary for display and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub requests_remaining: u32,
    pub reset_in_ms: i64,
    pub clock_skew_ms: i64,
}

fn minute_of(date: DateTime<Utc>) -> i64 {
    date.timestamp().div_euclid(60)
}

/// Shared rate-limit tracker.
///
/// One instance is owned by a client (usually behind an `Arc`) and updated
/// after every response. Updates and reads are serialized by an internal
/// mutex.
#[derive(Debug, Default)]
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RateLimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RateLimitState {
        *self.state()
    }

    /// Record one response.
    ///
    /// `rtt` is the measured round trip of the request; half of it is
    /// credited to the server's side when estimating the skew.
    pub fn record(&self, server_date: DateTime<Utc>, rtt: Duration, local_now: DateTime<Utc>) {
        let mut state = self.state();

        let same_minute = state
            .last_request_server_date
            .is_some_and(|last| minute_of(last) == minute_of(server_date));
        if !same_minute {
            state.requests_in_interval = 0;
        }

        state.requests_in_interval += 1;
        state.last_request_server_date = Some(server_date);
        state.clock_skew = server_date + rtt / 2 - local_now;

        debug!(
            "Rate limit: {} requests this minute, clock skew {}ms",
            state.requests_in_interval,
            state.clock_skew.num_milliseconds()
        );
    }

    /// Record a response from its raw `Date` header.
    ///
    /// Missing or unparsable headers leave the state untouched.
    pub fn observe_header(&self, date_header: Option<&str>, rtt: Duration, local_now: DateTime<Utc>) {
        let Some(value) = date_header else {
            debug!("Response carried no Date header");
            return;
        };

        match parse_http_date(value) {
            Ok(server_date) => self.record(server_date, rtt, local_now),
            Err(e) => warn!("Ignoring Date header: {}", e),
        }
    }

    /// Time until the current window ends, as seen from local time `now`.
    ///
    /// Zero when nothing was recorded yet or the server clock has already
    /// moved past the minute of the last response. A full window when the
    /// server clock appears to be behind the last response.
    pub fn reset_time(&self, now: DateTime<Utc>) -> Duration {
        Self::reset_time_of(&self.state(), now)
    }

    fn reset_time_of(state: &RateLimitState, now: DateTime<Utc>) -> Duration {
        let Some(last) = state.last_request_server_date else {
            return Duration::zero();
        };

        let server_now = now + state.clock_skew;
        let last_minute = minute_of(last);
        let server_minute = minute_of(server_now);

        if last_minute < server_minute {
            Duration::zero()
        } else if last_minute > server_minute {
            window()
        } else {
            let into_minute = Duration::seconds(server_now.timestamp().rem_euclid(60))
                + Duration::nanoseconds(i64::from(server_now.timestamp_subsec_nanos()));
            window() - into_minute
        }
    }

    /// Requests still allowed in the current window
    pub fn requests_remaining(&self, now: DateTime<Utc>) -> u32 {
        Self::remaining_of(&self.state(), now)
    }

    fn remaining_of(state: &RateLimitState, now: DateTime<Utc>) -> u32 {
        if Self::reset_time_of(state, now).is_zero() {
            RATE_LIMIT
        } else {
            RATE_LIMIT.saturating_sub(state.requests_in_interval)
        }
    }

    /// Current skew estimate (`server - local`)
    pub fn clock_skew(&self) -> Duration {
        self.state().clock_skew
    }

    /// Summary as of `now`
    pub fn status(&self, now: DateTime<Utc>) -> RateLimitStatus {
        let state = self.state();
        let reset = Self::reset_time_of(&state, now);
        RateLimitStatus {
            requests_remaining: Self::remaining_of(&state, now),
            reset_in_ms: reset.num_milliseconds(),
            clock_skew_ms: state.clock_skew.num_milliseconds(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
