//! Article extraction: raw HTML in, `{title, text}` out.

use scraper::{ElementRef, Html, Selector};

use crate::{Result, SearchError};

/// Default maximum characters kept from an article body.
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Elements whose content is never article text.
const BOILERPLATE: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
];

/// Content roots tried in order before falling back to `<body>`.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "#content", "body"];

/// Text-bearing blocks collected from the content root.
const BLOCKS: &str = "p, h1, h2, h3, h4, li, pre, blockquote";

/// Extracted article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Cleaned body text, paragraphs separated by blank lines.
    pub text: String,
}

/// Turns a fetched page into an [`Article`].
pub trait ArticleExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<Article>;
}

/// Heuristic extractor: picks the main content area and keeps its text blocks.
#[derive(Debug, Clone)]
pub struct ReadabilityExtractor {
    max_chars: usize,
}

impl ReadabilityExtractor {
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Caps the body length.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl Default for ReadabilityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleExtractor for ReadabilityExtractor {
    fn extract(&self, html: &str) -> Result<Article> {
        let document = Html::parse_document(html);
        let title = extract_title(&document);
        let text = truncate(&extract_text(&document), self.max_chars);

        if title.is_empty() && text.is_empty() {
            return Err(SearchError::Extraction(
                "no extractable content found".to_string(),
            ));
        }
        Ok(Article { title, text })
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn in_boilerplate(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| BOILERPLATE.contains(&e.name()))
    })
}

/// `og:title`, then `<title>`, then the first `<h1>`.
fn extract_title(document: &Html) -> String {
    if let Some(og) = selector(r#"meta[property="og:title"]"#) {
        let found = document
            .select(&og)
            .filter_map(|el| el.value().attr("content"))
            .map(collapse)
            .find(|t| !t.is_empty());
        if let Some(title) = found {
            return title;
        }
    }

    ["title", "h1"]
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| {
            document
                .select(&sel)
                .map(|el| collapse(&el.text().collect::<String>()))
                .find(|t| !t.is_empty())
        })
        .unwrap_or_default()
}

fn extract_text(document: &Html) -> String {
    let Some(blocks) = selector(BLOCKS) else {
        return String::new();
    };

    for root_css in CONTENT_ROOTS {
        let Some(root_sel) = selector(root_css) else {
            continue;
        };
        let Some(root) = document.select(&root_sel).next() else {
            continue;
        };

        let paragraphs: Vec<String> = root
            .select(&blocks)
            .filter(|el| !in_boilerplate(el))
            // Nested blocks (p inside li) would be counted twice.
            .filter(|el| {
                !el.ancestors()
                    .filter_map(ElementRef::wrap)
                    .take_while(|a| a.id() != root.id())
                    .any(|a| blocks.matches(&a))
            })
            .map(|el| collapse(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }
    }
    String::new()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
