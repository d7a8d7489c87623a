//! All-in-one search service: provider selection, placeholders and enrichment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::engine::EngineAdapter;
use crate::enrich::Enricher;
use crate::extract::ReadabilityExtractor;
use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::result::ResultRecord;
use crate::search::{Search, SearchOutcome, StopReason};
use crate::{engines, Result, SearchQuery};

/// Envelope returned to web callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub code: u16,
    pub msg: String,
    pub data: Vec<ResultRecord>,
}

impl SearchResponse {
    pub fn success(data: Vec<ResultRecord>) -> Self {
        Self {
            code: 200,
            msg: "success".to_string(),
            data,
        }
    }
}

/// A configured provider, page fetcher and enrichment stage behind one call.
///
/// Link dedup is always on. Searches never fail: problems show up as
/// partial results or the placeholder record.
pub struct WebSearch {
    config: SearchConfig,
    search: Search,
    enricher: Option<Enricher>,
    #[cfg(feature = "headless")]
    session: Option<Arc<crate::browser::BrowserSession>>,
}

impl WebSearch {
    /// Builds the service around an existing page fetcher. Enrichment, when
    /// enabled, uses a plain HTTP client.
    pub fn new(config: SearchConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let enricher = if config.enrich {
            let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::from_config(&config)?);
            Some(
                Enricher::new(http, Arc::new(ReadabilityExtractor::new()))
                    .with_budget(config.enrich_budget()),
            )
        } else {
            None
        };
        Self::with_enricher(config, fetcher, enricher)
    }

    /// Builds the service with an explicit enrichment stage (or none).
    pub fn with_enricher(
        config: SearchConfig,
        fetcher: Arc<dyn PageFetcher>,
        enricher: Option<Enricher>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = engines::lookup(&config.engine)?
            .with_search_box(config.search_box && fetcher.supports_search_box());
        debug!(
            "Using {} (search box: {})",
            engine.name(),
            engine.uses_search_box()
        );

        let search = Search::from_config(Arc::new(engine), fetcher, &config).ignore_duplicate_urls(true);
        Ok(Self {
            config,
            search,
            enricher,
            #[cfg(feature = "headless")]
            session: None,
        })
    }

    /// Builds the service on plain HTTP requests only.
    pub fn http(config: SearchConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
        Self::new(config, fetcher)
    }

    /// Builds the service on a shared headless browser session. The browser
    /// is launched by the first search.
    #[cfg(feature = "headless")]
    pub fn browser(config: SearchConfig) -> Result<Self> {
        use crate::browser::{BrowserFetcher, BrowserSession, BrowserSessionConfig};

        let session = Arc::new(BrowserSession::new(BrowserSessionConfig::from_config(&config)?));
        let fetcher = Arc::new(BrowserFetcher::from_config(Arc::clone(&session), &config));
        let mut service = Self::new(config, fetcher)?;
        service.session = Some(session);
        Ok(service)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The underlying orchestrator.
    pub fn orchestrator(&self) -> &Search {
        &self.search
    }

    /// Searches with the configured limits.
    pub async fn search(&self, text: &str) -> Vec<ResultRecord> {
        let query = SearchQuery::from_config(text, &self.config);
        self.run(&query, &CancellationToken::new()).await.records
    }

    /// Searches and wraps the records in a [`SearchResponse`].
    pub async fn respond(&self, text: &str) -> SearchResponse {
        SearchResponse::success(self.search(text).await)
    }

    /// Runs a search with placeholders and enrichment applied.
    ///
    /// A cancelled search returns what it had, unenriched.
    pub async fn run(&self, query: &SearchQuery, cancel: &CancellationToken) -> SearchOutcome {
        let mut outcome = self.search.run(query, cancel).await;

        if outcome.stop_reason == StopReason::EmptyQuery {
            return outcome;
        }
        if outcome.records.is_empty() {
            info!("No results for \"{}\" ({})", query.text, outcome.stop_reason);
            outcome.records.push(ResultRecord::no_results_placeholder());
            return outcome;
        }

        if let Some(enricher) = &self.enricher {
            if outcome.stop_reason != StopReason::Cancelled {
                let records = std::mem::take(&mut outcome.records);
                outcome.records = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Enrichment cancelled, returning results as collected");
                        records
                    }
                    enriched = enricher.enrich(records.clone()) => enriched,
                };
            }
        }
        outcome
    }

    /// Closes the browser, if this service owns one.
    pub async fn shutdown(&self) {
        #[cfg(feature = "headless")]
        if let Some(session) = &self.session {
            session.shutdown().await;
        }
    }
}
