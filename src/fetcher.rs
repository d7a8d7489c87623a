//! Page fetcher abstraction: "navigate to a URL, return status + HTML".

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::util::is_url;
use crate::{Result, SearchError};

/// Outcome of one page fetch.
///
/// `status == None` means no HTTP response was obtained at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: Option<u16>,
    pub html: String,
}

impl FetchResponse {
    pub fn new(status: u16, html: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            html: html.into(),
        }
    }

    /// A fetch that never got a response.
    pub fn failed() -> Self {
        Self {
            status: None,
            html: String::new(),
        }
    }

    /// Status 200.
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }

    /// 403, 429 or 503: the provider is probably rate limiting us.
    pub fn is_ban(&self) -> bool {
        matches!(self.status, Some(403 | 429 | 503))
    }

    /// Converts a non-200 outcome into the matching error, keeping the HTML otherwise.
    pub fn into_html(self) -> Result<String> {
        match self.status {
            Some(200) => Ok(self.html),
            Some(code) => Err(SearchError::HttpStatus(code)),
            None => Err(SearchError::Transport("no response".to_string())),
        }
    }
}

/// Per-fetch browsing context settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    pub user_agent: String,
    /// Locale, sent as `Accept-Language`.
    pub locale: String,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl ContextOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            locale: config.locale.clone(),
            headers: config.extra_headers.clone(),
        }
    }

    /// `Accept-Language` value for the locale, e.g. `en-US,en;q=0.9`.
    pub fn accept_language(&self) -> String {
        match self.locale.split_once('-') {
            Some((lang, _)) => format!("{},{};q=0.9", self.locale, lang),
            None => self.locale.clone(),
        }
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Fails with [`SearchError::InvalidUrl`] unless `url` is a navigable target.
pub fn ensure_navigable(url: &str) -> Result<()> {
    if is_url(url) {
        Ok(())
    } else {
        Err(SearchError::InvalidUrl(url.to_string()))
    }
}

/// Trait for fetching pages.
///
/// Implementations may use plain HTTP requests or a headless browser.
/// All configuration (user-agent, timeouts, settle pause) is set at
/// construction time. Transport failures are reported as
/// [`FetchResponse::failed`]; `Err` is reserved for requests that were never
/// attempted (bad URL, unavailable browser).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigates to `url` and returns the status and HTML.
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse>;

    /// Opens `base_url`, submits `query` through the page's search input and
    /// returns the resulting page.
    async fn fetch_via_search_box(&self, base_url: &str, _query: &str) -> Result<FetchResponse> {
        Err(SearchError::Browser(format!(
            "search box interaction is not supported for {}",
            base_url
        )))
    }

    /// Whether [`PageFetcher::fetch_via_search_box`] is implemented.
    fn supports_search_box(&self) -> bool {
        false
    }
}
