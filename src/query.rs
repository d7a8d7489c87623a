//! Search query representation.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::util::normalize_query;

/// A search query with its page and result limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms.
    pub text: String,
    /// Maximum number of result pages to fetch.
    pub max_pages: usize,
    /// Maximum number of results to return.
    pub max_results: usize,
}

impl SearchQuery {
    /// Creates a query fetching one page and returning up to four results.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_pages: 1,
            max_results: 4,
        }
    }

    /// Creates a query using the configured limits.
    pub fn from_config(text: impl Into<String>, config: &SearchConfig) -> Self {
        Self::new(text)
            .with_max_pages(config.max_pages)
            .with_max_results(config.max_results)
    }

    /// Sets the page limit.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the result limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Query text with escapes decoded and whitespace collapsed.
    pub fn normalized(&self) -> String {
        normalize_query(&self.text)
    }

    /// True when nothing searchable remains after normalization.
    pub fn is_empty(&self) -> bool {
        self.normalized().is_empty()
    }
}
