//! Baidu (百度).

use crate::engine::{EngineSpec, Selectors};

pub(super) fn spec() -> EngineSpec {
    EngineSpec {
        id: "baidu",
        name: "Baidu",
        base_url: "https://www.baidu.com/",
        search_path: "s?wd={query}&ie=utf-8",
        search_box: true,
        redirect_param: None,
        selectors: Selectors {
            url: "h3 a[href]".to_string(),
            title: "h3".to_string(),
            text: ".c-abstract, .c-span-last, .content-right_8Zs40".to_string(),
            links: "div.result, div.c-container".to_string(),
            next: "a.n[href]:last-of-type".to_string(),
        },
    }
}
