//! Bing.
//!
//! Bing rejects some crafted query URLs, so the first page goes through the
//! search box on the home page when a browser is available.

use crate::engine::{EngineSpec, Selectors};

pub(super) fn spec() -> EngineSpec {
    EngineSpec {
        id: "bing",
        name: "Bing",
        base_url: "https://www.bing.com/",
        search_path: "search?q={query}&form=QBRE",
        search_box: true,
        redirect_param: None,
        selectors: Selectors {
            url: "h2 a[href]".to_string(),
            title: "h2".to_string(),
            text: "p".to_string(),
            // Not scoped to ol#b_results: aggregated answer blocks break that.
            links: "li.b_algo".to_string(),
            next: "a.sb_pagN".to_string(),
        },
    }
}
