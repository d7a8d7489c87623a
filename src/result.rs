//! Search result types.

use serde::{Deserialize, Serialize};

use crate::util::domain;

const PLACEHOLDER_TITLE: &str = "The search engine is experiencing some glitches";
const PLACEHOLDER_LINK: &str = "https://www.bing.com";
const EMPTY_QUERY_SNIPPET: &str = "No input obtained, this may be caused by illegal characters in the question, please try other keywords.";
const NO_RESULTS_SNIPPET: &str = "No web search results obtained, please try other keywords and wait for a while before trying again";

/// A single search hit parsed from one result tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Domain of `link`.
    pub host: String,
    /// Absolute result URL.
    pub link: String,
    /// Result title.
    pub title: String,
    /// Result description/snippet.
    pub snippet: String,
}

impl ResultRecord {
    /// Creates a record, deriving `host` from the link.
    pub fn new(link: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        let link = link.into();
        Self {
            host: domain(&link),
            link,
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    /// Record returned when the query is empty or was rejected.
    pub fn empty_query_placeholder() -> Self {
        Self::new(PLACEHOLDER_LINK, PLACEHOLDER_TITLE, EMPTY_QUERY_SNIPPET)
    }

    /// Record returned when a search yields nothing.
    pub fn no_results_placeholder() -> Self {
        Self::new(PLACEHOLDER_LINK, PLACEHOLDER_TITLE, NO_RESULTS_SNIPPET)
    }
}

/// Insertion-ordered accumulator for one search invocation.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record unconditionally. Callers enforce dedup policy.
    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    /// Exact (all fields) membership test.
    pub fn contains(&self, record: &ResultRecord) -> bool {
        self.records.iter().any(|r| r == record)
    }

    /// Whether any record has this link.
    pub fn contains_link(&self, link: &str) -> bool {
        self.records.iter().any(|r| r.link == link)
    }

    /// Whether any record has this host.
    pub fn contains_host(&self, host: &str) -> bool {
        self.records.iter().any(|r| r.host == host)
    }

    /// All links in insertion order.
    pub fn links(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.link.as_str()).collect()
    }

    /// All hosts in insertion order.
    pub fn hosts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.host.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records.
    pub fn items(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Consumes the set, keeping at most `limit` records in insertion order.
    pub fn into_truncated(mut self, limit: usize) -> Vec<ResultRecord> {
        self.records.truncate(limit);
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_record_new_derives_host() {
        let record = ResultRecord::new("https://www.rust-lang.org/learn", "Learn", "Docs");
        assert_eq!(record.host, "www.rust-lang.org");
        assert_eq!(record.link, "https://www.rust-lang.org/learn");
        assert_eq!(record.title, "Learn");
        assert_eq!(record.snippet, "Docs");
    }

    #[test]
    fn test_placeholders() {
        let empty = ResultRecord::empty_query_placeholder();
        assert_eq!(empty.title, "The search engine is experiencing some glitches");
        assert_eq!(empty.link, "https://www.bing.com");
        assert_eq!(empty.host, "www.bing.com");
        assert!(empty.snippet.starts_with("No input obtained"));

        let none = ResultRecord::no_results_placeholder();
        assert_eq!(none.title, empty.title);
        assert!(none.snippet.starts_with("No web search results obtained"));
    }

    #[test]
    fn test_result_set_membership() {
        let mut set = ResultSet::new();
        let a = ResultRecord::new("https://a.com/1", "A", "first");
        set.push(a.clone());

        assert!(set.contains(&a));
        assert!(!set.contains(&ResultRecord::new("https://a.com/1", "A", "other")));
        assert!(set.contains_link("https://a.com/1"));
        assert!(set.contains_host("a.com"));
        assert!(!set.contains_host("b.com"));
    }

    #[test]
    fn test_result_set_listing_order() {
        let mut set = ResultSet::new();
        set.push(ResultRecord::new("https://b.com/", "B", ""));
        set.push(ResultRecord::new("https://a.com/", "A", ""));
        assert_eq!(set.links(), vec!["https://b.com/", "https://a.com/"]);
        assert_eq!(set.hosts(), vec!["b.com", "a.com"]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_into_truncated() {
        let mut set = ResultSet::new();
        for i in 0..5 {
            set.push(ResultRecord::new(format!("https://e.com/{i}"), "t", "s"));
        }
        let kept = set.clone().into_truncated(3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[2].link, "https://e.com/2");
        assert_eq!(set.into_truncated(10).len(), 5);
    }

    #[test]
    fn test_result_record_serialization() {
        let record = ResultRecord::new("https://example.com", "Title", "Snippet");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"host\":\"example.com\""));
        assert!(json.contains("\"link\":\"https://example.com\""));
    }
}
