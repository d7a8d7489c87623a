//! Brave Search.

use crate::engine::{EngineSpec, Selectors};

pub(super) fn spec() -> EngineSpec {
    EngineSpec {
        id: "brave",
        name: "Brave",
        base_url: "https://search.brave.com/",
        search_path: "search?q={query}&source=web",
        search_box: false,
        redirect_param: None,
        selectors: Selectors {
            url: r#"a[href^="http"]"#.to_string(),
            title: ".search-snippet-title, .title".to_string(),
            text: ".generic-snippet .content, .snippet-description".to_string(),
            links: r#"div.snippet[data-type="web"]"#.to_string(),
            next: r#"a.button[href*="offset="]:last-of-type"#.to_string(),
        },
    }
}
