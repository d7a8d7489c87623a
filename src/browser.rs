//! Headless browser fetch provider.
//!
//! This module is only available when the `headless` Cargo feature is enabled.
//! One browser process is launched lazily and shared by every search. Each
//! fetch runs in its own incognito browser context (separate cookies and
//! storage) that is disposed on every exit path, including cancellation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::fetcher::{ensure_navigable, ContextOptions, FetchResponse, PageFetcher};
use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// Inputs a search box can be found by across the supported providers.
const SEARCH_INPUT_SELECTOR: &str = "textarea[name='q'], input[name='q'], input[name='wd'], \
     input[name='query'], input[type='search']";

/// HTTP status of the current document, or 0 when Chrome does not expose it.
const STATUS_JS: &str = "(() => { \
     const e = performance.getEntriesByType('navigation')[0]; \
     return e && e.responseStatus ? e.responseStatus : 0; })()";

/// Configuration for the browser session.
#[derive(Debug, Clone)]
pub struct BrowserSessionConfig {
    /// Maximum number of concurrently open browser contexts.
    pub max_contexts: usize,
    /// Whether to run the browser in headless mode.
    pub headless: bool,
    /// Path to the Chrome/Chromium executable. If `None`, auto-detected.
    pub chrome_path: Option<PathBuf>,
    /// Proxy for all browser traffic.
    pub proxy: Option<ProxyConfig>,
    /// CDP request timeout.
    pub request_timeout: Duration,
    /// Additional launch arguments for Chrome.
    pub launch_args: Vec<String>,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            max_contexts: 4,
            headless: true,
            chrome_path: None,
            proxy: None,
            request_timeout: Duration::from_secs(30),
            launch_args: Vec::new(),
        }
    }
}

impl BrowserSessionConfig {
    /// Builds the session configuration, validating the proxy.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            max_contexts: config.max_contexts.max(1),
            proxy: config.proxy_config()?,
            request_timeout: config.timeout(),
            ..Default::default()
        })
    }
}

/// A single shared browser process with a cap on concurrent contexts.
///
/// The browser is launched on [`BrowserSession::start`] or lazily by the
/// first fetch.
pub struct BrowserSession {
    config: BrowserSessionConfig,
    browser: Mutex<Option<Arc<Browser>>>,
    contexts: Arc<Semaphore>,
}

impl BrowserSession {
    pub fn new(config: BrowserSessionConfig) -> Self {
        let max_contexts = config.max_contexts;
        Self {
            config,
            browser: Mutex::new(None),
            contexts: Arc::new(Semaphore::new(max_contexts)),
        }
    }

    /// Number of contexts that can still be opened without waiting.
    pub fn available_contexts(&self) -> usize {
        self.contexts.available_permits()
    }

    /// Launches the browser now instead of on first use.
    pub async fn start(&self) -> Result<()> {
        self.acquire_browser().await.map(|_| ())
    }

    async fn acquire_browser(&self) -> Result<Arc<Browser>> {
        let mut guard = self.browser.lock().await;

        if let Some(ref browser) = *guard {
            return Ok(Arc::clone(browser));
        }

        let chrome = crate::browser_setup::resolve_chrome(self.config.chrome_path.as_deref())?;
        info!("Launching browser: {}", chrome.display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .request_timeout(self.config.request_timeout);

        if self.config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        // Hide navigator.webdriver and the other automation markers.
        builder = builder.arg("--disable-blink-features=AutomationControlled");

        builder = builder
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-default-apps")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg("--no-first-run");

        if let Some(ref proxy) = self.config.proxy {
            if proxy.username.is_some() {
                warn!("Chrome ignores proxy credentials; connecting to {} without them", proxy.server());
            }
            builder = builder.arg(format!("--proxy-server={}", proxy.server()));
        }

        for arg in &self.config.launch_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| SearchError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to launch browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser CDP handler error: {}", e);
                }
            }
            debug!("Browser CDP handler exited");
        });

        let browser = Arc::new(browser);
        *guard = Some(Arc::clone(&browser));

        Ok(browser)
    }

    /// Opens a fresh incognito context with a blank page.
    async fn open_context(&self) -> Result<(ContextLease, Page)> {
        let permit = Arc::clone(&self.contexts)
            .acquire_owned()
            .await
            .map_err(|e| SearchError::Browser(format!("Context semaphore closed: {}", e)))?;

        let browser = self.acquire_browser().await?;

        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to create context: {}", e)))?;
        let context_id = created.result.browser_context_id.clone();

        // From here on the lease disposes the context whatever happens.
        let lease = ContextLease {
            browser: Arc::clone(&browser),
            id: Some(context_id.clone()),
            _permit: permit,
        };

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id)
            .build()
            .map_err(SearchError::Browser)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to open tab: {}", e)))?;

        Ok((lease, page))
    }

    /// Closes the browser process. Fetches still in flight keep it alive
    /// until they finish.
    pub async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;
        let Some(browser) = guard.take() else {
            return;
        };
        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                debug!("Browser session shut down");
            }
            Err(_) => debug!("Browser still in use; it exits with the last fetch"),
        }
    }
}

/// An open browser context. Disposed by [`ContextLease::release`], or in
/// the background when dropped.
struct ContextLease {
    browser: Arc<Browser>,
    id: Option<BrowserContextId>,
    _permit: OwnedSemaphorePermit,
}

impl ContextLease {
    async fn release(mut self) {
        if let Some(id) = self.id.take() {
            dispose_context(&self.browser, id).await;
        }
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let browser = Arc::clone(&self.browser);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { dispose_context(&browser, id).await });
            }
            Err(_) => warn!("No runtime to dispose browser context on"),
        }
    }
}

async fn dispose_context(browser: &Browser, id: BrowserContextId) {
    if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
        warn!("Failed to dispose browser context: {}", e);
    }
}

/// A [`PageFetcher`] that renders pages in the shared [`BrowserSession`].
pub struct BrowserFetcher {
    session: Arc<BrowserSession>,
    options: ContextOptions,
    settle: Duration,
    timeout: Duration,
    search_box_budget: Duration,
}

impl BrowserFetcher {
    /// Creates a fetcher with default context options and no settle pause.
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self {
            session,
            options: ContextOptions::default(),
            settle: Duration::ZERO,
            timeout: Duration::from_secs(30),
            search_box_budget: Duration::from_secs(5),
        }
    }

    /// Creates a fetcher using the configured user agent, locale, headers
    /// and timeouts.
    pub fn from_config(session: Arc<BrowserSession>, config: &SearchConfig) -> Self {
        Self::new(session)
            .with_options(ContextOptions::from_config(config))
            .with_timeout(config.timeout())
            .with_settle(config.settle())
            .with_search_box_budget(config.search_box_budget())
    }

    /// Sets the pause between the load event and reading the page.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Sets the per-context user agent, locale and headers.
    pub fn with_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the navigation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the duration above which a search-box interaction is warned about.
    pub fn with_search_box_budget(mut self, budget: Duration) -> Self {
        self.search_box_budget = budget;
        self
    }

    async fn prepare(&self, page: &Page) -> Result<()> {
        let agent = SetUserAgentOverrideParams::builder()
            .user_agent(self.options.user_agent.as_str())
            .accept_language(self.options.accept_language())
            .build()
            .map_err(SearchError::Browser)?;
        page.set_user_agent(agent)
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to set user agent: {}", e)))?;

        if !self.options.headers.is_empty() {
            let headers = serde_json::to_value(&self.options.headers)?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .map_err(|e| SearchError::Browser(format!("Failed to set headers: {}", e)))?;
        }
        Ok(())
    }

    async fn open(&self) -> Result<(ContextLease, Page)> {
        let (lease, page) = self.session.open_context().await?;
        self.prepare(&page).await?;
        Ok((lease, page))
    }

    /// Navigates and waits; never fails, navigation problems become
    /// [`FetchResponse::failed`].
    async fn load(&self, page: &Page, url: &str) -> FetchResponse {
        match timeout(self.timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("Navigation to {} failed: {}", url, e);
                return FetchResponse::failed();
            }
            Err(_) => {
                warn!("Navigation to {} timed out after {:?}", url, self.timeout);
                return FetchResponse::failed();
            }
        }
        self.settle(page).await;
        self.snapshot(page).await
    }

    /// Waits for the load event, then for the settle pause if one is set.
    async fn settle(&self, page: &Page) {
        if let Err(e) = page.wait_for_navigation().await {
            debug!("Navigation wait failed: {}", e);
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }

    async fn snapshot(&self, page: &Page) -> FetchResponse {
        let status = match page.evaluate(STATUS_JS).await {
            Ok(value) => value.into_value::<u16>().unwrap_or(0),
            Err(e) => {
                debug!("Status probe failed: {}", e);
                0
            }
        };

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to get page content: {}", e);
                return FetchResponse::failed();
            }
        };

        match status {
            0 if html.is_empty() => FetchResponse::failed(),
            // Chrome withholds the status for some documents; a rendered page counts as 200.
            0 => FetchResponse::new(200, html),
            code => FetchResponse::new(code, html),
        }
    }

    async fn submit_query(&self, page: &Page, query: &str) -> FetchResponse {
        let input = match page.find_element(SEARCH_INPUT_SELECTOR).await {
            Ok(input) => input,
            Err(e) => {
                warn!("Search input not found: {}", e);
                return FetchResponse::failed();
            }
        };

        let typed = async {
            input.click().await?;
            input.type_str(query).await?;
            input.press_key("Enter").await?;
            Ok::<_, CdpError>(())
        };
        match timeout(self.timeout, typed).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Search box interaction failed: {}", e);
                return FetchResponse::failed();
            }
            Err(_) => {
                warn!("Search box interaction timed out after {:?}", self.timeout);
                return FetchResponse::failed();
            }
        }

        self.settle(page).await;
        self.snapshot(page).await
    }

    async fn close(page: Page, lease: ContextLease) {
        if let Err(e) = page.close().await {
            debug!("Failed to close browser tab: {}", e);
        }
        lease.release().await;
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
        ensure_navigable(url)?;
        let (lease, page) = self.open().await?;
        let response = self.load(&page, url).await;
        Self::close(page, lease).await;
        Ok(response)
    }

    async fn fetch_via_search_box(&self, base_url: &str, query: &str) -> Result<FetchResponse> {
        ensure_navigable(base_url)?;
        let started = Instant::now();

        let (lease, page) = self.open().await?;
        let home = self.load(&page, base_url).await;
        let response = if home.is_ok() {
            self.submit_query(&page, query).await
        } else {
            home
        };
        Self::close(page, lease).await;

        let elapsed = started.elapsed();
        if elapsed > self.search_box_budget {
            warn!(
                "Search box query on {} took {:.2}s (budget {:.2}s)",
                base_url,
                elapsed.as_secs_f64(),
                self.search_box_budget.as_secs_f64()
            );
        } else {
            debug!("Search box query on {} took {:?}", base_url, elapsed);
        }
        Ok(response)
    }

    fn supports_search_box(&self) -> bool {
        true
    }
}
