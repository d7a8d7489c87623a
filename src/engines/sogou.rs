//! Sogou (搜狗).

use crate::engine::{EngineSpec, Selectors};

pub(super) fn spec() -> EngineSpec {
    EngineSpec {
        id: "sogou",
        name: "Sogou",
        base_url: "https://www.sogou.com/",
        search_path: "web?query={query}&page=1&ie=utf8",
        search_box: false,
        redirect_param: None,
        selectors: Selectors {
            url: "h3 a[href]".to_string(),
            title: "h3".to_string(),
            text: ".str-text, .str_info, .space-txt, p".to_string(),
            links: "div.vrwrap, div.rb".to_string(),
            next: "#sogou_next".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineAdapter, TableEngine};
    use crate::engines::fixtures::page;
    use crate::search::extract_records;
    use scraper::Html;

    #[test]
    fn test_sogou_first_page() {
        let engine = TableEngine::new(spec()).unwrap();
        let request = engine.first_page_request("rust");
        assert_eq!(
            request.url.as_deref(),
            Some("https://www.sogou.com/web?query=rust&page=1&ie=utf8")
        );
    }

    #[test]
    fn test_sogou_relative_links_resolve_against_base() {
        let html = page(
            r#"
            <div class="vrwrap">
                <h3><a href="/link?url=abc">Rust 官网</a></h3>
                <p class="str_info">Rust 程序设计语言</p>
            </div>
            <a id="sogou_next" href="?query=rust&page=2&ie=utf8">下一页</a>
            "#,
        );
        let document = Html::parse_document(&html);
        let engine = TableEngine::new(spec()).unwrap();
        let records = extract_records(&engine, &document).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://www.sogou.com/link?url=abc");
        assert_eq!(records[0].host, "www.sogou.com");

        let next = engine.next_page_request(&document, "rust");
        assert_eq!(
            next.url.as_deref(),
            Some("https://www.sogou.com/?query=rust&page=2&ie=utf8")
        );
    }
}
