//! Client configuration
//!
//! Defaults match the public WaniKani API. Every field can be overridden
//! from the environment:
//! - `TSURUKAME_API_TOKEN`
//! - `TSURUKAME_API_BASE_URL`
//! - `TSURUKAME_HTTP_TIMEOUT_SECS`
//! - `TSURUKAME_SPECULATIVE_PAGES`
//! - `TSURUKAME_SPECULATIVE_PER_PAGE`

use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::api::ApiError;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.wanikani.com/v2";

/// Pages requested at once by a speculative subject fetch
pub const DEFAULT_SPECULATIVE_PAGES: u32 = 9;

/// Page size assumed by a speculative subject fetch
pub const DEFAULT_SPECULATIVE_PER_PAGE: u32 = 1000;

/// Default HTTP timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result type for configuration
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No API token configured (set TSURUKAME_API_TOKEN or pass --token)")]
    MissingToken,
    #[error("Invalid base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}

/// Everything needed to build a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_token: Option<String>,
    /// Always a valid absolute URL when set through this type's methods
    pub base_url: String,
    pub timeout: Duration,
    pub speculative_pages: u32,
    pub speculative_per_page: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            speculative_pages: DEFAULT_SPECULATIVE_PAGES,
            speculative_per_page: DEFAULT_SPECULATIVE_PER_PAGE,
            user_agent: format!("tsurukame/{}", crate::VERSION),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(token) = lookup("TSURUKAME_API_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.api_token = Some(token.trim().to_string());
        }

        if let Some(value) = lookup("TSURUKAME_API_BASE_URL") {
            config = config.with_base_url(&value)?;
        }

        if let Some(secs) = parse_number::<u64>(&lookup, "TSURUKAME_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(pages) = parse_number::<u32>(&lookup, "TSURUKAME_SPECULATIVE_PAGES") {
            config.speculative_pages = pages.max(1);
        }

        if let Some(per_page) = parse_number::<u32>(&lookup, "TSURUKAME_SPECULATIVE_PER_PAGE") {
            config.speculative_per_page = per_page.max(1);
        }

        Ok(config)
    }

    /// Replace the base URL
    pub fn with_base_url(mut self, value: &str) -> Result<Self> {
        let url = parse_base_url(value)?;
        self.base_url = url.to_string();
        Ok(self)
    }

    /// The parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        parse_base_url(&self.base_url)
    }

    /// Replace the token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// The token, or an error if none is configured
    pub fn require_token(&self) -> Result<&str> {
        self.api_token.as_deref().ok_or(ConfigError::MissingToken)
    }
}

fn parse_base_url(value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        source,
    })
}

fn parse_number<N: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<N> {
    let value = lookup(name)?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", name, value);
            None
        }
    }
}
