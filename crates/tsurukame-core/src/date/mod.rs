//! Date Module
//!
//! Timestamp handling for the WaniKani API:
//! - Ordered parser strategies for every known wire variant
//! - Canonical microsecond UTC formatting
//! - RFC 1123 `Date` header parsing for rate-limit tracking

mod codec;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use codec::{
    format, parse, parse_http_date, DateCodec, DateError, DateParser, PatternParser, Result,
    ZoneSuffix, BASIC_LAYOUT, CANONICAL_FORMAT, DEFAULT_CODEC, EXTENDED_LAYOUT,
};

// ============================================================================
// WANIKANI DATE
// ============================================================================

/// A timestamp as it travels over the wire.
///
/// Deserializes from any format the default codec accepts and always
/// serializes to the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WaniKaniDate(DateTime<Utc>);

impl WaniKaniDate {
    /// Wrap a UTC timestamp
    pub fn new(date: DateTime<Utc>) -> Self {
        Self(date)
    }

    /// The wrapped timestamp
    pub fn date(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds since the Unix epoch
    pub fn seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl From<DateTime<Utc>> for WaniKaniDate {
    fn from(date: DateTime<Utc>) -> Self {
        Self(date)
    }
}

impl From<WaniKaniDate> for DateTime<Utc> {
    fn from(date: WaniKaniDate) -> Self {
        date.0
    }
}

impl FromStr for WaniKaniDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s).map(Self)
    }
}

impl TryFrom<String> for WaniKaniDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WaniKaniDate> for String {
    fn from(date: WaniKaniDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for WaniKaniDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(&self.0))
    }
}
