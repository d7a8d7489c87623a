//! Engine adapter interface and the table-driven adapter used by every provider.
//!
//! A provider varies in which CSS selectors locate the parts of a result page,
//! how the first page is requested, and how the "next page" link is found
//! (plus how its result links unwrap). Pagination, filtering and
//! deduplication live in [`crate::Search`].

use std::fmt;
use std::str::FromStr;

use scraper::{Html, Selector};
use url::Url;

use crate::{Result, SearchError};

/// The parts of a result page an adapter supplies selectors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorRole {
    /// Link element inside a result tag (its `href` is the result URL).
    Url,
    /// Title element inside a result tag.
    Title,
    /// Snippet element inside a result tag.
    Text,
    /// One element per result on the page.
    Links,
    /// The "next page" anchor.
    Next,
}

impl SelectorRole {
    pub const ALL: [SelectorRole; 5] = [
        SelectorRole::Url,
        SelectorRole::Title,
        SelectorRole::Text,
        SelectorRole::Links,
        SelectorRole::Next,
    ];
}

impl FromStr for SelectorRole {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "url" => Ok(SelectorRole::Url),
            "title" => Ok(SelectorRole::Title),
            "text" => Ok(SelectorRole::Text),
            "links" => Ok(SelectorRole::Links),
            "next" => Ok(SelectorRole::Next),
            other => Err(SearchError::UnsupportedRole(other.to_string())),
        }
    }
}

impl fmt::Display for SelectorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectorRole::Url => "url",
            SelectorRole::Title => "title",
            SelectorRole::Text => "text",
            SelectorRole::Links => "links",
            SelectorRole::Next => "next",
        };
        f.write_str(name)
    }
}

/// CSS selectors for every [`SelectorRole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub url: String,
    pub title: String,
    pub text: String,
    pub links: String,
    pub next: String,
}

impl Selectors {
    pub fn get(&self, role: SelectorRole) -> &str {
        match role {
            SelectorRole::Url => &self.url,
            SelectorRole::Title => &self.title,
            SelectorRole::Text => &self.text,
            SelectorRole::Links => &self.links,
            SelectorRole::Next => &self.next,
        }
    }

    /// Ensures every selector is present and parses.
    pub fn validate(&self) -> Result<()> {
        for role in SelectorRole::ALL {
            let css = self.get(role);
            if css.trim().is_empty() {
                return Err(SearchError::Parse(format!("Empty selector for role '{}'", role)));
            }
            compile(css)?;
        }
        Ok(())
    }
}

/// Compiles a CSS selector, mapping failures to [`SearchError::Parse`].
pub fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector '{}': {:?}", css, e)))
}

/// The next navigation target of a search. `url == None` ends the page loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Absolute URL to navigate to, or the base URL for search-box requests.
    pub url: Option<String>,
    /// The query text this request belongs to.
    pub query: String,
    /// Drive the page's search input instead of navigating to `url` directly.
    pub search_box: bool,
}

impl PageRequest {
    /// Plain navigation to `url`.
    pub fn navigate(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            query: query.into(),
            search_box: false,
        }
    }

    /// Open `base_url` and submit `query` through its search box.
    pub fn via_search_box(base_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: Some(base_url.into()),
            query: query.into(),
            search_box: true,
        }
    }

    /// No further pages.
    pub fn end(query: impl Into<String>) -> Self {
        Self {
            url: None,
            query: query.into(),
            search_box: false,
        }
    }

    pub fn is_end(&self) -> bool {
        self.url.is_none()
    }
}

/// Per-provider capability set.
pub trait EngineAdapter: Send + Sync {
    /// Provider identifier (e.g. "bing").
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// CSS selector for a role.
    fn selector_for(&self, role: SelectorRole) -> &str;

    /// Builds the initial navigation target.
    fn first_page_request(&self, query: &str) -> PageRequest;

    /// First-page request that navigates straight to a results URL, for
    /// fetchers that cannot drive a search box. `None` if the provider has none.
    fn direct_page_request(&self, query: &str) -> Option<PageRequest> {
        let request = self.first_page_request(query);
        (!request.search_box).then_some(request)
    }

    /// Inspects the parsed page for a "next" link.
    fn next_page_request(&self, page: &Html, query: &str) -> PageRequest;

    /// Turns a result `href` into an absolute link. The default keeps it as is.
    fn resolve_link(&self, href: &str) -> String {
        href.to_string()
    }

    /// Looks a selector up by role name, failing on unknown roles.
    fn selector_named(&self, role: &str) -> Result<&str> {
        let role: SelectorRole = role.parse()?;
        Ok(self.selector_for(role))
    }
}

/// A provider table entry: everything that differs between providers, as data.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    /// Provider identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Site root, used for search-box navigation and for resolving relative links.
    pub base_url: &'static str,
    /// Path and query template relative to `base_url`; `{query}` is replaced
    /// by the percent-encoded query.
    pub search_path: &'static str,
    /// Whether the provider can be driven through its search box.
    pub search_box: bool,
    /// Query parameter of the provider's click-tracking redirect that carries
    /// the real target, if result links go through one.
    pub redirect_param: Option<&'static str>,
    /// Result page selectors.
    pub selectors: Selectors,
}

/// Adapter driven entirely by an [`EngineSpec`].
#[derive(Debug, Clone)]
pub struct TableEngine {
    spec: EngineSpec,
    base: Url,
    use_search_box: bool,
}

impl TableEngine {
    /// Creates an adapter, checking the spec's selectors and base URL up front.
    pub fn new(spec: EngineSpec) -> Result<Self> {
        spec.selectors.validate()?;
        let base = Url::parse(spec.base_url)?;
        let use_search_box = spec.search_box;
        Ok(Self {
            spec,
            base,
            use_search_box,
        })
    }

    /// Enables or disables search-box interaction. Ignored for providers
    /// without a usable search box.
    pub fn with_search_box(mut self, enabled: bool) -> Self {
        self.use_search_box = enabled && self.spec.search_box;
        self
    }

    pub fn uses_search_box(&self) -> bool {
        self.use_search_box
    }

    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    /// The direct query URL for the first page.
    pub fn query_url(&self, query: &str) -> String {
        let path = self
            .spec
            .search_path
            .replace("{query}", &urlencoding::encode(query));
        self.resolve(&path).unwrap_or_else(|| format!("{}{}", self.spec.base_url, path))
    }

    fn resolve(&self, href: &str) -> Option<String> {
        self.base.join(href).ok().map(String::from)
    }
}

impl EngineAdapter for TableEngine {
    fn id(&self) -> &str {
        self.spec.id
    }

    fn name(&self) -> &str {
        self.spec.name
    }

    fn selector_for(&self, role: SelectorRole) -> &str {
        self.spec.selectors.get(role)
    }

    fn first_page_request(&self, query: &str) -> PageRequest {
        if self.use_search_box {
            PageRequest::via_search_box(self.spec.base_url, query)
        } else {
            PageRequest::navigate(self.query_url(query), query)
        }
    }

    fn direct_page_request(&self, query: &str) -> Option<PageRequest> {
        Some(PageRequest::navigate(self.query_url(query), query))
    }

    fn next_page_request(&self, page: &Html, query: &str) -> PageRequest {
        let Ok(selector) = compile(self.selector_for(SelectorRole::Next)) else {
            return PageRequest::end(query);
        };
        let href = page
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty() && !href.starts_with('#'));

        match href.and_then(|h| self.resolve(h)) {
            Some(url) => PageRequest::navigate(url, query),
            None => PageRequest::end(query),
        }
    }

    fn resolve_link(&self, href: &str) -> String {
        let Some(absolute) = self.base.join(href.trim()).ok() else {
            return href.to_string();
        };
        if let Some(param) = self.spec.redirect_param {
            if let Some((_, target)) = absolute.query_pairs().find(|(k, _)| k == param) {
                return target.into_owned();
            }
        }
        absolute.into()
    }
}
