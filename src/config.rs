//! Search configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::{DedupPolicy, FilterSet};
use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// Default desktop user agent sent by browser contexts and the HTTP client.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0";

/// Configuration consumed by the fetchers, the orchestrator and the facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider identifier (e.g. "bing").
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Maximum number of result pages per search.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Maximum number of results per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Navigation timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Proxy URL, if any.
    #[serde(default)]
    pub proxy: Option<String>,
    /// User agent for browser contexts and plain HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Locale for browser contexts (Accept-Language).
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Extra headers sent with every browser navigation.
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// Whether providers that support it are driven through their search box.
    #[serde(default = "default_true")]
    pub search_box: bool,
    /// Warn when a search-box interaction takes longer than this.
    #[serde(default = "default_search_box_budget_ms")]
    pub search_box_budget_ms: u64,
    /// Extra pause after a browser page has loaded, for results rendered by script.
    #[serde(default)]
    pub settle_ms: u64,
    /// Lower bound of the randomized inter-page delay.
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,
    /// Upper bound of the randomized inter-page delay.
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
    /// Collect only unique links.
    #[serde(default)]
    pub unique_urls: bool,
    /// Collect only unique hosts.
    #[serde(default)]
    pub unique_hosts: bool,
    /// Comma-separated filter operators (url, title, snippet/text, host).
    #[serde(default)]
    pub filters: Option<String>,
    /// Re-fetch result links and replace title/snippet with article text.
    #[serde(default = "default_true")]
    pub enrich: bool,
    /// Warn when enriching one batch of results takes longer than this.
    #[serde(default = "default_enrich_budget_ms")]
    pub enrich_budget_ms: u64,
    /// Directory for html/csv/json reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum number of concurrent browser contexts.
    #[serde(default = "default_max_contexts")]
    pub max_contexts: usize,
}

fn default_engine() -> String {
    "bing".to_string()
}

fn default_max_pages() -> usize {
    1
}

fn default_max_results() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_search_box_budget_ms() -> u64 {
    5_000
}

fn default_enrich_budget_ms() -> u64 {
    5_000
}

fn default_delay_min_ms() -> u64 {
    10
}

fn default_delay_max_ms() -> u64 {
    1_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("search_results")
}

fn default_max_contexts() -> usize {
    4
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            max_pages: default_max_pages(),
            max_results: default_max_results(),
            timeout_ms: default_timeout_ms(),
            proxy: None,
            user_agent: default_user_agent(),
            locale: default_locale(),
            extra_headers: BTreeMap::new(),
            search_box: true,
            search_box_budget_ms: default_search_box_budget_ms(),
            settle_ms: 0,
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            unique_urls: false,
            unique_hosts: false,
            filters: None,
            enrich: true,
            enrich_budget_ms: default_enrich_budget_ms(),
            output_dir: default_output_dir(),
            max_contexts: default_max_contexts(),
        }
    }
}

impl SearchConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: SearchConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints and the proxy format.
    pub fn validate(&self) -> Result<()> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(SearchError::InvalidConfig(format!(
                "delay_min_ms ({}) exceeds delay_max_ms ({})",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        if self.max_contexts == 0 {
            return Err(SearchError::InvalidConfig(
                "max_contexts must be at least 1".to_string(),
            ));
        }
        self.proxy_config()?;
        Ok(())
    }

    /// Parsed proxy, failing with `InvalidProxy` on malformed values.
    pub fn proxy_config(&self) -> Result<Option<ProxyConfig>> {
        self.proxy.as_deref().map(ProxyConfig::parse).transpose()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn search_box_budget(&self) -> Duration {
        Duration::from_millis(self.search_box_budget_ms)
    }

    /// Pause after the load event before a browser page is read.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn enrich_budget(&self) -> Duration {
        Duration::from_millis(self.enrich_budget_ms)
    }

    /// Inter-page delay bounds.
    pub fn delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.delay_min_ms),
            Duration::from_millis(self.delay_max_ms),
        )
    }

    /// Dedup switches as a policy.
    pub fn dedup(&self) -> DedupPolicy {
        DedupPolicy {
            unique_urls: self.unique_urls,
            unique_hosts: self.unique_hosts,
        }
    }

    /// Filter set built from `filters`; unsupported tokens are logged and dropped.
    pub fn filter_set(&self) -> FilterSet {
        match self.filters.as_deref() {
            Some(ops) => FilterSet::parse(ops).0,
            None => FilterSet::new(),
        }
    }
}
