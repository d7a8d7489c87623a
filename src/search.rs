//! Search orchestration: the provider-agnostic page loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use scraper::{ElementRef, Html};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::engine::{compile, EngineAdapter, PageRequest, SelectorRole};
use crate::fetcher::{FetchResponse, PageFetcher};
use crate::filter::{DedupPolicy, FilterSet};
use crate::result::{ResultRecord, ResultSet};
use crate::util::unquote_url;
use crate::{Result, SearchQuery};

/// Where a search currently is in its page loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Init,
    FetchingPage,
    Parsing,
    Filtering,
    CollectingResults,
    Done,
    Banned,
}

/// Why the page loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Enough results were collected.
    ResultLimit,
    /// The last allowed page was processed.
    PageLimit,
    /// The page had no "next" link.
    NoNextPage,
    /// A page came back with a non-200 status.
    HttpStatus(u16),
    /// A page could not be fetched at all.
    Transport,
    /// A page could not be parsed with the provider's selectors.
    ParseFailure,
    /// The caller cancelled the search.
    Cancelled,
    /// The query was empty; nothing was fetched.
    EmptyQuery,
    /// `max_pages` was zero; nothing was fetched.
    NoPages,
    /// The provider needs a search box the fetcher cannot drive.
    SearchBoxUnsupported,
}

impl StopReason {
    /// True when the loop ended because a page could not be obtained or read.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::HttpStatus(_)
                | StopReason::Transport
                | StopReason::ParseFailure
                | StopReason::SearchBoxUnsupported
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ResultLimit => f.write_str("result limit reached"),
            StopReason::PageLimit => f.write_str("page limit reached"),
            StopReason::NoNextPage => f.write_str("no next page"),
            StopReason::HttpStatus(code) => write!(f, "HTTP status {}", code),
            StopReason::Transport => f.write_str("transport failure"),
            StopReason::ParseFailure => f.write_str("parse failure"),
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::EmptyQuery => f.write_str("empty query"),
            StopReason::NoPages => f.write_str("no pages requested"),
            StopReason::SearchBoxUnsupported => f.write_str("search box not supported by the fetcher"),
        }
    }
}

/// Result of one [`Search::run`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// At most `max_results` records in insertion order.
    pub records: Vec<ResultRecord>,
    pub stop_reason: StopReason,
    /// Final stage: `Done`, or `Banned` after a 403/429/503. Other failed
    /// pages also end in `Done`; see [`SearchOutcome::is_failure`].
    pub stage: SearchStage,
    pub pages_fetched: usize,
}

impl SearchOutcome {
    fn empty(stop_reason: StopReason) -> Self {
        Self {
            records: Vec::new(),
            stop_reason,
            stage: SearchStage::Done,
            pages_fetched: 0,
        }
    }

    pub fn is_banned(&self) -> bool {
        self.stage == SearchStage::Banned
    }

    /// Whether the loop ended on a failed page rather than a limit or cancel.
    /// The records collected before the failure are still returned.
    pub fn is_failure(&self) -> bool {
        self.stop_reason.is_failure()
    }
}

/// Drives an [`EngineAdapter`] and a [`PageFetcher`] through the page loop.
pub struct Search {
    adapter: Arc<dyn EngineAdapter>,
    fetcher: Arc<dyn PageFetcher>,
    filters: FilterSet,
    dedup: DedupPolicy,
    delay: (Duration, Duration),
    search_box: bool,
    banned: AtomicBool,
}

impl Search {
    /// Creates a search with no filters, no dedup beyond exact repeats and
    /// a 10ms..1s inter-page delay.
    ///
    /// Search-box providers fall back to their query URL when `fetcher` cannot
    /// drive a search box.
    pub fn new(adapter: Arc<dyn EngineAdapter>, fetcher: Arc<dyn PageFetcher>) -> Self {
        let search_box = fetcher.supports_search_box();
        Self {
            adapter,
            fetcher,
            search_box,
            filters: FilterSet::new(),
            dedup: DedupPolicy::default(),
            delay: (Duration::from_millis(10), Duration::from_secs(1)),
            banned: AtomicBool::new(false),
        }
    }

    /// Creates a search with the configured filters, dedup switches and delay.
    pub fn from_config(
        adapter: Arc<dyn EngineAdapter>,
        fetcher: Arc<dyn PageFetcher>,
        config: &SearchConfig,
    ) -> Self {
        let (min, max) = config.delay_range();
        Self::new(adapter, fetcher)
            .with_filters(config.filter_set())
            .with_dedup(config.dedup())
            .with_delay(min, max)
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Enables filters from a comma-separated operator string such as
    /// `"title,host"`. Unsupported operators are logged and skipped.
    pub fn with_operators(mut self, operators: &str) -> Self {
        self.filters = FilterSet::parse(operators).0;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Collect only unique links.
    pub fn ignore_duplicate_urls(mut self, enabled: bool) -> Self {
        self.dedup.unique_urls = enabled;
        self
    }

    /// Collect only unique hosts.
    pub fn ignore_duplicate_domains(mut self, enabled: bool) -> Self {
        self.dedup.unique_hosts = enabled;
        self
    }

    /// Bounds of the random pause between pages. `max` below `min` is raised to `min`.
    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.delay = (min, max.max(min));
        self
    }

    /// The adapter this search drives.
    pub fn adapter(&self) -> &Arc<dyn EngineAdapter> {
        &self.adapter
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn dedup(&self) -> DedupPolicy {
        self.dedup
    }

    /// Whether any search so far was answered with 403, 429 or 503.
    pub fn is_banned(&self) -> bool {
        self.banned.load(Ordering::Relaxed)
    }

    /// Runs the page loop and returns only the records.
    pub async fn search(&self, text: &str, max_pages: usize, max_results: usize) -> Vec<ResultRecord> {
        let query = SearchQuery::new(text)
            .with_max_pages(max_pages)
            .with_max_results(max_results);
        self.run(&query, &CancellationToken::new()).await.records
    }

    /// Runs the page loop until a limit is hit, a page fails or `cancel` fires.
    ///
    /// Failures never discard what was already collected.
    pub async fn run(&self, query: &SearchQuery, cancel: &CancellationToken) -> SearchOutcome {
        let text = query.normalized();
        if text.is_empty() {
            debug!("Empty query, returning placeholder");
            let mut outcome = SearchOutcome::empty(StopReason::EmptyQuery);
            outcome.records.push(ResultRecord::empty_query_placeholder());
            return outcome;
        }
        if query.max_pages == 0 {
            return SearchOutcome::empty(StopReason::NoPages);
        }

        let engine = self.adapter.name().to_string();
        let mut stage = SearchStage::Init;
        let mut results = ResultSet::new();
        let Some(mut request) = self.first_request(&text) else {
            warn!("{}: needs a search box and the fetcher cannot drive one", engine);
            return SearchOutcome::empty(StopReason::SearchBoxUnsupported);
        };
        let mut page = 0;
        let mut pages_fetched = 0;

        let stop_reason = loop {
            page += 1;
            let Some(url) = request.url.clone() else {
                break StopReason::NoNextPage;
            };

            advance(&mut stage, SearchStage::FetchingPage, page);
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break StopReason::Cancelled,
                fetched = self.fetch(&url, &request) => fetched,
            };
            pages_fetched += 1;

            let response = match fetched {
                Ok(response) => response,
                Err(e) => {
                    warn!("{}: page {} could not be fetched: {}", engine, page, e);
                    break StopReason::Transport;
                }
            };
            match response.status {
                Some(200) => {}
                Some(code) => {
                    if response.is_ban() {
                        self.banned.store(true, Ordering::Relaxed);
                        advance(&mut stage, SearchStage::Banned, page);
                        warn!("{}: HTTP {} on page {}, the provider is probably blocking us", engine, code, page);
                    } else {
                        warn!("{}: HTTP {} on page {}", engine, code, page);
                    }
                    break StopReason::HttpStatus(code);
                }
                None => {
                    warn!("{}: no response for page {} ({})", engine, page, url);
                    break StopReason::Transport;
                }
            }

            advance(&mut stage, SearchStage::Parsing, page);
            let (records, next) = match self.parse_page(&response, &text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("{}: page {} could not be parsed: {}", engine, page, e);
                    break StopReason::ParseFailure;
                }
            };
            let found = records.len();

            advance(&mut stage, SearchStage::Filtering, page);
            let records = self.filters.apply(&text, records);

            advance(&mut stage, SearchStage::CollectingResults, page);
            let added = self.dedup.collect_into(&mut results, records);
            info!(page, links = found, added, total = results.len(), "{}: page processed", engine);

            if results.len() >= query.max_results {
                break StopReason::ResultLimit;
            }
            if page >= query.max_pages {
                break StopReason::PageLimit;
            }
            if next.is_end() {
                break StopReason::NoNextPage;
            }
            request = next;

            let pause = self.random_delay();
            debug!("Sleeping {:?} before page {}", pause, page + 1);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = tokio::time::sleep(pause) => {}
            }
        };

        if stage != SearchStage::Banned {
            stage = SearchStage::Done;
        }
        debug!("{}: search finished after {} page(s): {}", engine, pages_fetched, stop_reason);

        SearchOutcome {
            records: results.into_truncated(query.max_results),
            stop_reason,
            stage,
            pages_fetched,
        }
    }

    fn first_request(&self, text: &str) -> Option<PageRequest> {
        let request = self.adapter.first_page_request(text);
        if !request.search_box || self.search_box {
            return Some(request);
        }
        debug!("{}: fetcher has no search box support, using the query URL", self.adapter.name());
        self.adapter.direct_page_request(text)
    }

    async fn fetch(&self, url: &str, request: &PageRequest) -> Result<FetchResponse> {
        if request.search_box {
            self.fetcher.fetch_via_search_box(url, &request.query).await
        } else {
            self.fetcher.fetch_page(url).await
        }
    }

    /// Parses synchronously so the non-`Send` document never crosses an await.
    fn parse_page(&self, response: &FetchResponse, text: &str) -> Result<(Vec<ResultRecord>, PageRequest)> {
        let document = Html::parse_document(&response.html);
        let records = extract_records(self.adapter.as_ref(), &document)?;
        let next = self.adapter.next_page_request(&document, text);
        Ok((records, next))
    }

    fn random_delay(&self) -> Duration {
        let (min, max) = self.delay;
        if min >= max {
            return min;
        }
        let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
        Duration::from_millis(millis as u64)
    }
}

fn advance(stage: &mut SearchStage, next: SearchStage, page: usize) {
    debug!(page, "{:?} -> {:?}", stage, next);
    *stage = next;
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts one record per "links" match, in document order.
///
/// Tags without a usable link are skipped; missing titles or snippets become
/// empty strings.
pub fn extract_records<A>(adapter: &A, page: &Html) -> Result<Vec<ResultRecord>>
where
    A: EngineAdapter + ?Sized,
{
    let links = compile(adapter.selector_for(SelectorRole::Links))?;
    let url = compile(adapter.selector_for(SelectorRole::Url))?;
    let title = compile(adapter.selector_for(SelectorRole::Title))?;
    let text = compile(adapter.selector_for(SelectorRole::Text))?;

    let mut records = Vec::new();
    for tag in page.select(&links) {
        let Some(href) = tag
            .select(&url)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
        else {
            continue;
        };
        let link = unquote_url(&adapter.resolve_link(href));
        let title = tag.select(&title).next().map(text_of).unwrap_or_default();
        let snippet = tag.select(&text).next().map(text_of).unwrap_or_default();
        records.push(ResultRecord::new(link, title, snippet));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineSpec, Selectors, TableEngine};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    const BASE: &str = "https://search.example.com/";

    fn engine(search_box: bool) -> TableEngine {
        TableEngine::new(EngineSpec {
            id: "test",
            name: "Test",
            base_url: BASE,
            search_path: "search?q={query}",
            search_box,
            redirect_param: None,
            selectors: Selectors {
                url: "a[href]".to_string(),
                title: "h2".to_string(),
                text: "p".to_string(),
                links: "li.result".to_string(),
                next: "a.next".to_string(),
            },
        })
        .unwrap()
    }

    fn tag(link: &str, title: &str, snippet: &str) -> String {
        format!(
            r#"<li class="result"><h2><a href="{}">{}</a></h2><p>{}</p></li>"#,
            link, title, snippet
        )
    }

    fn page(tags: &[String], next: Option<&str>) -> String {
        let next = next
            .map(|href| format!(r#"<a class="next" href="{}">Next</a>"#, href))
            .unwrap_or_default();
        format!("<html><body><ol>{}</ol>{}</body></html>", tags.concat(), next)
    }

    fn first_url(query: &str) -> String {
        format!("{}search?q={}", BASE, query)
    }

    /// Serves canned responses by URL and counts requests.
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, FetchResponse>,
        calls: AtomicUsize,
        search_box_calls: Mutex<Vec<(String, String)>>,
        cancel_on_fetch: Option<CancellationToken>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: impl Into<String>, status: u16, html: String) -> Self {
            self.pages.insert(url.into(), FetchResponse::new(status, html));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = &self.cancel_on_fetch {
                token.cancel();
            }
            Ok(self.pages.get(url).cloned().unwrap_or_else(FetchResponse::failed))
        }

        async fn fetch_via_search_box(&self, base_url: &str, query: &str) -> Result<FetchResponse> {
            self.search_box_calls
                .lock()
                .unwrap()
                .push((base_url.to_string(), query.to_string()));
            self.fetch_page(&format!("{}#box", base_url)).await
        }

        fn supports_search_box(&self) -> bool {
            true
        }
    }

    fn search(fetcher: Arc<FakeFetcher>) -> Search {
        Search::new(Arc::new(engine(false)), fetcher).with_delay(Duration::ZERO, Duration::ZERO)
    }

    fn cat_tags(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| tag(&format!("https://cats{}.com/", i), &format!("Cats {}", i), "meow"))
            .collect()
    }

    #[tokio::test]
    async fn test_result_limit_keeps_document_order() {
        let fetcher = Arc::new(
            FakeFetcher::default().with_page(first_url("cats"), 200, page(&cat_tags(6), None)),
        );
        let search = search(fetcher.clone()).with_operators("title");

        let query = SearchQuery::new("cats").with_max_pages(1).with_max_results(4);
        let outcome = search.run(&query, &CancellationToken::new()).await;

        assert_eq!(outcome.stop_reason, StopReason::ResultLimit);
        assert_eq!(outcome.stage, SearchStage::Done);
        let links: Vec<_> = outcome.records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://cats0.com/",
                "https://cats1.com/",
                "https://cats2.com/",
                "https://cats3.com/"
            ]
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_ban_status_on_first_page() {
        let fetcher = Arc::new(
            FakeFetcher::default().with_page(first_url("cats"), 429, "Too many".to_string()),
        );
        let search = search(fetcher);

        let query = SearchQuery::new("cats").with_max_pages(3);
        let outcome = search.run(&query, &CancellationToken::new()).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::HttpStatus(429));
        assert!(outcome.is_banned());
        assert!(search.is_banned());
    }

    #[tokio::test]
    async fn test_non_ban_status_stops_without_ban() {
        let fetcher = Arc::new(
            FakeFetcher::default().with_page(first_url("cats"), 500, String::new()),
        );
        let search = search(fetcher);
        let outcome = search
            .run(&SearchQuery::new("cats"), &CancellationToken::new())
            .await;
        assert_eq!(outcome.stop_reason, StopReason::HttpStatus(500));
        assert!(!search.is_banned());
        assert_eq!(outcome.stage, SearchStage::Done);
    }

    #[tokio::test]
    async fn test_empty_query_returns_placeholder_without_fetching() {
        let fetcher = Arc::new(FakeFetcher::default());
        let search = search(fetcher.clone());

        let records = search.search("   ", 1, 4).await;
        assert_eq!(records, vec![ResultRecord::empty_query_placeholder()]);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_pages_fetches_nothing() {
        let fetcher = Arc::new(FakeFetcher::default());
        let search = search(fetcher.clone());

        let outcome = search
            .run(&SearchQuery::new("cats").with_max_pages(0), &CancellationToken::new())
            .await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::NoPages);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_follows_next_link_until_absent() {
        let page2 = format!("{}search?q=cats&page=2", BASE);
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with_page(
                    first_url("cats"),
                    200,
                    page(&cat_tags(2), Some("/search?q=cats&page=2")),
                )
                .with_page(
                    page2,
                    200,
                    page(&[tag("https://dogs.com/", "Dogs", "woof")], None),
                ),
        );
        let search = search(fetcher.clone());

        let query = SearchQuery::new("cats").with_max_pages(5).with_max_results(10);
        let outcome = search.run(&query, &CancellationToken::new()).await;

        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.records[2].host, "dogs.com");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with_page(first_url("cats"), 200, page(&cat_tags(1), Some("/p2")))
                .with_page(
                    format!("{}p2", BASE),
                    200,
                    page(&[tag("https://b.com/", "b", "")], Some("/p3")),
                ),
        );
        let search = search(fetcher.clone());

        let query = SearchQuery::new("cats").with_max_pages(2).with_max_results(10);
        let outcome = search.run(&query, &CancellationToken::new()).await;
        assert_eq!(outcome.stop_reason, StopReason::PageLimit);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_partial_results() {
        // The second page is not served, so the fake reports no response.
        let fetcher = Arc::new(FakeFetcher::default().with_page(
            first_url("cats"),
            200,
            page(&cat_tags(2), Some("/missing")),
        ));
        let search = search(fetcher);

        let query = SearchQuery::new("cats").with_max_pages(3).with_max_results(10);
        let outcome = search.run(&query, &CancellationToken::new()).await;
        assert_eq!(outcome.stop_reason, StopReason::Transport);
        assert!(outcome.is_failure());
        assert_eq!(outcome.stage, SearchStage::Done);
        assert_eq!(outcome.records.len(), 2);
        assert!(!search.is_banned());
    }

    #[tokio::test]
    async fn test_returned_length_is_min_of_limit_and_collected() {
        for (available, limit) in [(3, 5), (5, 5), (6, 2), (0, 4)] {
            let fetcher = Arc::new(FakeFetcher::default().with_page(
                first_url("cats"),
                200,
                page(&cat_tags(available), None),
            ));
            let records = search(fetcher).search("cats", 1, limit).await;
            assert_eq!(records.len(), available.min(limit));
        }
    }

    #[tokio::test]
    async fn test_unique_hosts_across_pages() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with_page(
                    first_url("cats"),
                    200,
                    page(
                        &[
                            tag("https://a.com/1", "Cats a1", ""),
                            tag("https://a.com/2", "Cats a2", ""),
                        ],
                        Some("/p2"),
                    ),
                )
                .with_page(
                    format!("{}p2", BASE),
                    200,
                    page(
                        &[
                            tag("https://a.com/3", "Cats a3", ""),
                            tag("https://b.com/1", "Cats b1", ""),
                        ],
                        None,
                    ),
                ),
        );
        let search = search(fetcher).ignore_duplicate_domains(true);

        let records = search.search("cats", 2, 10).await;
        let hosts: Vec<_> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["a.com", "b.com"]);
        let unique: HashSet<_> = hosts.iter().collect();
        assert_eq!(unique.len(), hosts.len());
    }

    #[tokio::test]
    async fn test_unique_urls() {
        let tags = vec![
            tag("https://a.com/1", "Cats", "one"),
            tag("https://a.com/1", "Cats", "two"),
            tag("https://a.com/2", "Cats", "three"),
        ];
        let fetcher = Arc::new(FakeFetcher::default().with_page(
            first_url("cats"),
            200,
            page(&tags, None),
        ));

        let all = search(fetcher.clone()).search("cats", 1, 10).await;
        assert_eq!(all.len(), 3);

        let unique = search(fetcher)
            .ignore_duplicate_urls(true)
            .search("cats", 1, 10)
            .await;
        let links: Vec<_> = unique.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://a.com/1", "https://a.com/2"]);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let fetcher = Arc::new(FakeFetcher::default());
        let search = search(fetcher.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = search.run(&SearchQuery::new("cats"), &cancel).await;
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert!(outcome.records.is_empty());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_delay_keeps_partial_results() {
        let cancel = CancellationToken::new();
        let fetcher = Arc::new(FakeFetcher {
            cancel_on_fetch: Some(cancel.clone()),
            ..FakeFetcher::default()
                .with_page(first_url("cats"), 200, page(&cat_tags(2), Some("/p2")))
        });
        let search = Search::new(Arc::new(engine(false)), fetcher.clone())
            .with_delay(Duration::from_secs(30), Duration::from_secs(30));

        let query = SearchQuery::new("cats").with_max_pages(3).with_max_results(10);
        let outcome = search.run(&query, &cancel).await;
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_first_page_through_search_box() {
        let fetcher = Arc::new(FakeFetcher::default().with_page(
            format!("{}#box", BASE),
            200,
            page(&cat_tags(1), None),
        ));
        let search = Search::new(Arc::new(engine(true)), fetcher.clone());

        let records = search.search("cats  and dogs", 1, 4).await;
        assert_eq!(records.len(), 1);
        let calls = fetcher.search_box_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(BASE.to_string(), "cats and dogs".to_string())]);
    }

    /// Answers every URL with one Bing-style result; no search box support.
    #[derive(Default)]
    struct PlainFetcher {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for PlainFetcher {
        async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(FetchResponse::new(
                200,
                r#"<ol id="b_results"><li class="b_algo"><h2><a href="https://www.rust-lang.org/">Rust</a></h2><p>A language</p></li></ol>"#,
            ))
        }
    }

    #[tokio::test]
    async fn test_search_box_provider_falls_back_to_query_url() {
        let fetcher = Arc::new(PlainFetcher::default());
        let bing = crate::engines::lookup("bing").unwrap();
        assert!(bing.uses_search_box());
        let search = Search::new(Arc::new(bing), fetcher.clone());

        let outcome = search.run(&SearchQuery::new("rust"), &CancellationToken::new()).await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].title, "Rust");
        assert_eq!(outcome.stop_reason, StopReason::PageLimit);
        assert!(!outcome.is_failure());
        let urls = fetcher.urls.lock().unwrap().clone();
        assert_eq!(urls, vec!["https://www.bing.com/search?q=rust&form=QBRE".to_string()]);
    }

    /// A provider that can only be queried through its search box.
    struct BoxOnly;

    impl EngineAdapter for BoxOnly {
        fn id(&self) -> &str {
            "box"
        }

        fn name(&self) -> &str {
            "Box"
        }

        fn selector_for(&self, role: SelectorRole) -> &str {
            match role {
                SelectorRole::Links => "li.result",
                SelectorRole::Url => "a[href]",
                SelectorRole::Title => "h2",
                SelectorRole::Text => "p",
                SelectorRole::Next => "a.next",
            }
        }

        fn first_page_request(&self, query: &str) -> PageRequest {
            PageRequest::via_search_box(BASE, query)
        }

        fn next_page_request(&self, _page: &Html, query: &str) -> PageRequest {
            PageRequest::end(query)
        }
    }

    #[tokio::test]
    async fn test_search_box_only_provider_without_support() {
        let fetcher = Arc::new(PlainFetcher::default());
        let search = Search::new(Arc::new(BoxOnly), fetcher.clone());

        let outcome = search.run(&SearchQuery::new("rust"), &CancellationToken::new()).await;
        assert_eq!(outcome.stop_reason, StopReason::SearchBoxUnsupported);
        assert!(outcome.is_failure());
        assert!(!outcome.is_banned());
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.pages_fetched, 0);
        assert!(fetcher.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters_apply_before_collection() {
        let tags = vec![
            tag("https://a.com/", "Cats", "x"),
            tag("https://b.com/", "Dogs", "x"),
        ];
        let fetcher = Arc::new(FakeFetcher::default().with_page(
            first_url("cats"),
            200,
            page(&tags, None),
        ));
        let search = search(fetcher).with_operators("title,bogus");
        let records = search.search("cats", 1, 10).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, "a.com");
    }

    #[test]
    fn test_extract_records_skips_tags_without_link() {
        let html = page(
            &[
                r#"<li class="result"><h2>No link</h2></li>"#.to_string(),
                tag("https://a.com/x%20y", "  Spaced \n title ", "snip"),
            ],
            None,
        );
        let document = Html::parse_document(&html);
        let records = extract_records(&engine(false), &document).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Spaced title");
        assert_eq!(records[0].link, "https://a.com/x y");
    }

    #[test]
    fn test_with_delay_orders_bounds() {
        let search = search(Arc::new(FakeFetcher::default()))
            .with_delay(Duration::from_millis(50), Duration::from_millis(10));
        assert_eq!(search.random_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_from_config() {
        let config = SearchConfig {
            filters: Some("host".to_string()),
            unique_urls: true,
            ..Default::default()
        };
        let search = Search::from_config(
            Arc::new(engine(false)),
            Arc::new(FakeFetcher::default()),
            &config,
        );
        assert!(search.filters().contains(crate::filter::FilterDimension::Host));
        assert!(search.dedup().unique_urls);
        assert!(!search.dedup().unique_hosts);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::HttpStatus(429).to_string(), "HTTP status 429");
        assert_eq!(StopReason::ResultLimit.to_string(), "result limit reached");
    }

    #[test]
    fn test_stop_reason_is_failure() {
        assert!(StopReason::Transport.is_failure());
        assert!(StopReason::HttpStatus(500).is_failure());
        assert!(StopReason::ParseFailure.is_failure());
        assert!(!StopReason::PageLimit.is_failure());
        assert!(!StopReason::Cancelled.is_failure());
        assert!(!StopReason::EmptyQuery.is_failure());
    }
}
