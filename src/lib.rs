//! # a3s-websearch
//!
//! A paginating web search scraper. It drives one search provider page by
//! page through a shared headless browser, filters and deduplicates the
//! hits, and optionally enriches each hit with the linked page's article text.
//!
//! - Table-driven providers (Bing, Brave, DuckDuckGo, Baidu, Sogou)
//! - One browser process, an isolated context per fetch
//! - Search operators (`url`, `title`, `snippet`, `host`) and link/host dedup
//! - Concurrent best-effort content enrichment
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_websearch::{SearchConfig, WebSearch};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SearchConfig {
//!         engine: "duckduckgo".to_string(),
//!         max_results: 5,
//!         ..Default::default()
//!     };
//!     let service = WebSearch::http(config)?;
//!
//!     for record in service.search("rust programming").await {
//!         println!("{}: {}", record.title, record.link);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod engine;
mod enrich;
mod error;
mod extract;
mod filter;
mod query;
mod result;
mod search;
mod service;

pub mod engines;
pub mod fetcher;
pub mod fetcher_http;
pub mod output;
pub mod proxy;
pub mod util;

#[cfg(feature = "headless")]
pub mod browser;
#[cfg(feature = "headless")]
pub mod browser_setup;

pub use config::{SearchConfig, DEFAULT_USER_AGENT};
pub use engine::{EngineAdapter, EngineSpec, PageRequest, SelectorRole, Selectors, TableEngine};
pub use enrich::Enricher;
pub use error::{Result, SearchError};
pub use extract::{Article, ArticleExtractor, ReadabilityExtractor};
pub use fetcher::{FetchResponse, PageFetcher};
pub use filter::{DedupPolicy, FilterDimension, FilterSet};
pub use query::SearchQuery;
pub use result::{ResultRecord, ResultSet};
pub use search::{extract_records, Search, SearchOutcome, SearchStage, StopReason};
pub use service::{SearchResponse, WebSearch};
