//! Date Codec
//!
//! The API hands out timestamps in several shapes depending on the endpoint
//! and on when the record was written. Parsing walks an ordered list of
//! [`DateParser`] strategies and takes the first match; formatting always
//! emits the canonical microsecond UTC form.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound, TimeZone, Utc};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Canonical output format: `yyyy-MM-dd'T'HH:mm:ss.SSSSSS'Z'`
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Date layout with `-` separators (fractional seconds optional)
pub const EXTENDED_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Date layout without `-` separators (fractional seconds optional)
pub const BASIC_LAYOUT: &str = "%Y%m%dT%H:%M:%S%.f";

/// Parsed values keep at most this many fractional digits
const SUBSECOND_DIGITS: u16 = 6;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Date codec error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// No registered parser accepted the string
    #[error("Unrecognized timestamp format: {0:?}")]
    Unrecognized(String),
    /// An HTTP `Date` header that isn't RFC 1123
    #[error("Invalid HTTP date: {0:?}")]
    InvalidHttpDate(String),
}

/// Date codec result type
pub type Result<T> = std::result::Result<T, DateError>;

// ============================================================================
// PARSER STRATEGIES
// ============================================================================

/// One way of reading a timestamp string.
///
/// Strategies return `None` rather than an error so the codec can move on to
/// the next one.
pub trait DateParser: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Try to parse `input`, normalized to UTC
    fn parse(&self, input: &str) -> Option<DateTime<Utc>>;
}

/// How a pattern expects the timezone to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSuffix {
    /// A literal trailing `Z`
    Zulu,
    /// `+HH`, `+HHMM` or `+HH:MM` (or `-`)
    NumericOffset,
}

/// A chrono layout plus a timezone suffix style
#[derive(Debug, Clone, Copy)]
pub struct PatternParser {
    name: &'static str,
    layout: &'static str,
    zone: ZoneSuffix,
}

impl PatternParser {
    /// Create a pattern strategy
    pub const fn new(name: &'static str, layout: &'static str, zone: ZoneSuffix) -> Self {
        Self { name, layout, zone }
    }
}

impl DateParser for PatternParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(&self, input: &str) -> Option<DateTime<Utc>> {
        let (body, offset) = match self.zone {
            ZoneSuffix::Zulu => (input.strip_suffix('Z')?, FixedOffset::east_opt(0)?),
            ZoneSuffix::NumericOffset => split_numeric_offset(input)?,
        };

        let naive = NaiveDateTime::parse_from_str(body, self.layout).ok()?;
        let local = offset.from_local_datetime(&naive).single()?;
        Some(local.with_timezone(&Utc).trunc_subsecs(SUBSECOND_DIGITS))
    }
}

/// Split `2018-08-05T11:08:39+03:00` into the local part and its offset.
///
/// The sign is searched for after the `T` only, since the date itself uses `-`.
fn split_numeric_offset(input: &str) -> Option<(&str, FixedOffset)> {
    let time_start = input.find('T')?;
    let sign_pos = time_start + input[time_start..].rfind(['+', '-'])?;
    let (body, zone) = input.split_at(sign_pos);

    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let digits = &zone[1..];
    if !digits.is_ascii() {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits, "00"),
        4 => (&digits[..2], &digits[2..]),
        5 if digits.as_bytes()[2] == b':' => (&digits[..2], &digits[3..]),
        _ => return None,
    };
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some((body, offset))
}

// ============================================================================
// DATE CODEC
// ============================================================================

/// Ordered list of parser strategies
///
/// [`DateCodec::default`] registers every format the WaniKani API is known to
/// return. More strategies can be appended with [`DateCodec::with_parser`]
/// without changing any call site that goes through the codec.
pub struct DateCodec {
    parsers: Vec<Box<dyn DateParser>>,
}

impl Default for DateCodec {
    fn default() -> Self {
        Self::empty()
            .with_parser(PatternParser::new(
                "extended-zulu",
                EXTENDED_LAYOUT,
                ZoneSuffix::Zulu,
            ))
            .with_parser(PatternParser::new(
                "basic-zulu",
                BASIC_LAYOUT,
                ZoneSuffix::Zulu,
            ))
            .with_parser(PatternParser::new(
                "extended-offset",
                EXTENDED_LAYOUT,
                ZoneSuffix::NumericOffset,
            ))
    }
}

impl fmt::Debug for DateCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateCodec")
            .field("parsers", &self.parser_names())
            .finish()
    }
}

impl DateCodec {
    /// A codec with no strategies (rejects everything)
    pub fn empty() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Append a strategy; it is tried after the existing ones
    pub fn with_parser(mut self, parser: impl DateParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Names of the registered strategies, in trial order
    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Parse with the first strategy that accepts the input
    pub fn parse(&self, input: &str) -> Result<DateTime<Utc>> {
        self.parsers
            .iter()
            .find_map(|parser| parser.parse(input))
            .ok_or_else(|| DateError::Unrecognized(input.to_string()))
    }

    /// Format in the canonical API form
    pub fn format(date: &DateTime<Utc>) -> String {
        date.format(CANONICAL_FORMAT).to_string()
    }
}

/// Codec with the default WaniKani strategies
pub static DEFAULT_CODEC: LazyLock<DateCodec> = LazyLock::new(DateCodec::default);

/// Parse an API timestamp with the default codec
pub fn parse(input: &str) -> Result<DateTime<Utc>> {
    DEFAULT_CODEC.parse(input)
}

/// Format a timestamp in the canonical API form
pub fn format(date: &DateTime<Utc>) -> String {
    DateCodec::format(date)
}

/// Parse an RFC 1123 `Date` header (`Sun, 05 Aug 2018 11:08:39 GMT`)
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| DateError::InvalidHttpDate(value.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
