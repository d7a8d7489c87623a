//! DuckDuckGo (HTML endpoint).
//!
//! The HTML endpoint paginates through a POST form rather than a link, so the
//! next selector rarely matches and searches usually stop after one page.

use crate::engine::{EngineSpec, Selectors};

pub(super) fn spec() -> EngineSpec {
    EngineSpec {
        id: "duckduckgo",
        name: "DuckDuckGo",
        base_url: "https://html.duckduckgo.com/",
        search_path: "html/?q={query}",
        search_box: false,
        redirect_param: Some("uddg"),
        selectors: Selectors {
            url: ".result__title a[href]".to_string(),
            title: ".result__title".to_string(),
            text: ".result__snippet".to_string(),
            links: "div.result".to_string(),
            next: "a.result--more__btn[href]".to_string(),
        },
    }
}
