//! HTTP-based page fetcher using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::fetcher::{ensure_navigable, ContextOptions, FetchResponse, PageFetcher};
use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Used for enrichment and for providers that serve results without
/// JavaScript. It cannot drive search boxes.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher sending the context's user agent and headers.
    pub fn new(
        options: &ContextOptions,
        timeout: Duration,
        proxy: Option<&ProxyConfig>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(options.user_agent.as_str())
            .default_headers(default_headers(options)?)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Creates a fetcher from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let proxy = config.proxy_config()?;
        Self::new(
            &ContextOptions::from_config(config),
            config.timeout(),
            proxy.as_ref(),
        )
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn default_headers(options: &ContextOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let locale = HeaderValue::from_str(&options.accept_language())
        .map_err(|e| SearchError::InvalidConfig(format!("locale: {}", e)))?;
    headers.insert(ACCEPT_LANGUAGE, locale);

    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SearchError::InvalidConfig(format!("header '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SearchError::InvalidConfig(format!("header '{}': {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
        ensure_navigable(url)?;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                return Ok(FetchResponse::failed());
            }
        };

        let status = response.status().as_u16();
        debug!("GET {} -> {}", url, status);
        match response.text().await {
            Ok(html) => Ok(FetchResponse::new(status, html)),
            Err(e) => {
                warn!("Reading body of {} failed: {}", url, e);
                Ok(FetchResponse::failed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ContextOptions::default(), Duration::from_secs(5), None).unwrap()
    }

    #[test]
    fn test_http_fetcher_with_client() {
        let client = Client::builder().user_agent("test-agent").build().unwrap();
        let _fetcher = HttpFetcher::with_client(client);
    }

    #[test]
    fn test_http_fetcher_from_config_rejects_bad_header() {
        let mut config = SearchConfig::default();
        config
            .extra_headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            HttpFetcher::from_config(&config),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header("accept-language", "en-US,en;q=0.9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .mount(&server)
            .await;

        let response = fetcher()
            .fetch_page(&format!("{}/article", server.uri()))
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.html, "<html>hello</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_ban_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let response = fetcher().fetch_page(&server.uri()).await.unwrap();
        assert_eq!(response.status, Some(429));
        assert!(response.is_ban());
    }

    #[tokio::test]
    async fn test_fetch_page_extra_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-trace", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let mut options = ContextOptions::default();
        options
            .headers
            .insert("X-Trace".to_string(), "abc".to_string());
        let fetcher = HttpFetcher::new(&options, Duration::from_secs(5), None).unwrap();
        let response = fetcher.fetch_page(&server.uri()).await.unwrap();
        assert_eq!(response.html, "ok");
    }

    #[tokio::test]
    async fn test_fetch_page_invalid_url() {
        let result = fetcher().fetch_page("not-a-url").await;
        assert!(matches!(result, Err(SearchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_connection_refused() {
        let response = fetcher().fetch_page("http://127.0.0.1:9/").await.unwrap();
        assert!(response.status.is_none());
    }

    #[tokio::test]
    async fn test_search_box_not_supported() {
        let fetcher = fetcher();
        assert!(!fetcher.supports_search_box());
        assert!(fetcher
            .fetch_via_search_box("https://www.bing.com/", "rust")
            .await
            .is_err());
    }
}
