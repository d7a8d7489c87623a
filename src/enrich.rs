//! Best-effort content enrichment of collected results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::extract::ArticleExtractor;
use crate::fetcher::PageFetcher;
use crate::result::ResultRecord;
use crate::{Result, SearchError};

/// Re-fetches every result link and replaces title/snippet with the
/// extracted article.
pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ArticleExtractor>,
    budget: Duration,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<dyn ArticleExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            budget: Duration::from_secs(5),
        }
    }

    /// Warn when a whole enrichment pass takes longer than `budget`.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Enriches all records concurrently. The output has the same length and
    /// order as the input; records that fail keep their original content.
    pub async fn enrich(&self, records: Vec<ResultRecord>) -> Vec<ResultRecord> {
        let started = Instant::now();
        let count = records.len();

        let enriched = join_all(records.into_iter().map(|record| async move {
            match self.enrich_one(&record).await {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("{}", e);
                    record
                }
            }
        }))
        .await;

        let elapsed = started.elapsed();
        if elapsed > self.budget {
            warn!(
                "Enriching {} results took {:.2}s",
                count,
                elapsed.as_secs_f64()
            );
        } else {
            debug!("Enriched {} results in {:?}", count, elapsed);
        }
        enriched
    }

    async fn enrich_one(&self, record: &ResultRecord) -> Result<ResultRecord> {
        let failure = |reason: String| SearchError::Enrichment {
            url: record.link.clone(),
            reason,
        };

        let html = self
            .fetcher
            .fetch_page(&record.link)
            .await
            .and_then(|response| response.into_html())
            .map_err(|e| failure(e.to_string()))?;
        let article = self
            .extractor
            .extract(&html)
            .map_err(|e| failure(e.to_string()))?;

        let mut updated = record.clone();
        let title = article.title.trim();
        if !title.is_empty() {
            updated.title = title.to_string();
        }
        let text = article.text.replace('\n', "");
        if !text.trim().is_empty() {
            updated.snippet = text;
        }
        Ok(updated)
    }
}
