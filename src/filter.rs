//! Result filtering and deduplication policy.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::result::{ResultRecord, ResultSet};
use crate::util::{domain, is_url};
use crate::SearchError;

/// A record field that a filter can require the query to appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    Url,
    Title,
    Snippet,
    Host,
}

impl FilterDimension {
    /// Value of this dimension on a record.
    fn value_of<'a>(&self, record: &'a ResultRecord) -> std::borrow::Cow<'a, str> {
        match self {
            FilterDimension::Url => record.link.as_str().into(),
            FilterDimension::Title => record.title.as_str().into(),
            FilterDimension::Snippet => record.snippet.as_str().into(),
            FilterDimension::Host => domain(&record.link).into(),
        }
    }
}

impl FromStr for FilterDimension {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" => Ok(FilterDimension::Url),
            "title" => Ok(FilterDimension::Title),
            "snippet" | "text" => Ok(FilterDimension::Snippet),
            "host" => Ok(FilterDimension::Host),
            other => Err(SearchError::UnsupportedFilter(other.to_string())),
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterDimension::Url => "url",
            FilterDimension::Title => "title",
            FilterDimension::Snippet => "snippet",
            FilterDimension::Host => "host",
        };
        f.write_str(name)
    }
}

/// Set of enabled filter dimensions. Empty means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    dimensions: BTreeSet<FilterDimension>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated operator string such as `"title,host"`.
    ///
    /// Unknown tokens are returned as errors alongside the set built from the
    /// valid ones; they never invalidate the rest of the request.
    pub fn parse(operators: &str) -> (Self, Vec<SearchError>) {
        let mut set = Self::new();
        let mut rejected = Vec::new();
        for token in operators.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<FilterDimension>() {
                Ok(dimension) => set.insert(dimension),
                Err(e) => {
                    warn!("Ignoring unsupported operator \"{}\"", token);
                    rejected.push(e);
                }
            }
        }
        (set, rejected)
    }

    /// Builds a set from dimensions.
    pub fn from_dimensions(dimensions: impl IntoIterator<Item = FilterDimension>) -> Self {
        Self {
            dimensions: dimensions.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, dimension: FilterDimension) {
        self.dimensions.insert(dimension);
    }

    pub fn contains(&self, dimension: FilterDimension) -> bool {
        self.dimensions.contains(&dimension)
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// True if the query occurs (case-insensitively) in every enabled dimension.
    pub fn matches(&self, query: &str, record: &ResultRecord) -> bool {
        let needle = query.to_lowercase();
        self.dimensions
            .iter()
            .all(|d| d.value_of(record).to_lowercase().contains(&needle))
    }

    /// Keeps the records that pass, preserving order.
    pub fn apply(&self, query: &str, records: Vec<ResultRecord>) -> Vec<ResultRecord> {
        if self.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.matches(query, r))
            .collect()
    }
}

/// Which duplicates the collector suppresses beyond exact repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupPolicy {
    /// Collect only unique links.
    pub unique_urls: bool,
    /// Collect only unique hosts.
    pub unique_hosts: bool,
}

impl DedupPolicy {
    /// Whether `record` may be appended to `set`.
    pub fn admits(&self, set: &ResultSet, record: &ResultRecord) -> bool {
        if !is_url(&record.link) {
            return false;
        }
        if set.contains(record) {
            return false;
        }
        if self.unique_urls && set.contains_link(&record.link) {
            return false;
        }
        if self.unique_hosts && set.contains_host(&record.host) {
            return false;
        }
        true
    }

    /// Appends every admitted record in order; returns how many were added.
    pub fn collect_into(&self, set: &mut ResultSet, records: Vec<ResultRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.admits(set, &record) {
                set.push(record);
                added += 1;
            }
        }
        added
    }
}
