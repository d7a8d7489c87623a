//! Provider table.
//!
//! Each provider is one [`EngineSpec`] entry; adding a provider means adding
//! a module with a `spec()` function and a [`Provider`] variant.

use std::fmt;
use std::str::FromStr;

use crate::engine::{EngineSpec, TableEngine};
use crate::{Result, SearchError};

// International engines
mod bing;
mod brave;
mod duckduckgo;

// Chinese engines
mod baidu;
mod sogou;

/// Supported search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Bing,
    Brave,
    DuckDuckGo,
    Baidu,
    Sogou,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Bing,
        Provider::Brave,
        Provider::DuckDuckGo,
        Provider::Baidu,
        Provider::Sogou,
    ];

    /// The table entry for this provider.
    pub fn spec(&self) -> EngineSpec {
        match self {
            Provider::Bing => bing::spec(),
            Provider::Brave => brave::spec(),
            Provider::DuckDuckGo => duckduckgo::spec(),
            Provider::Baidu => baidu::spec(),
            Provider::Sogou => sogou::spec(),
        }
    }

    /// Provider identifier.
    pub fn id(&self) -> &'static str {
        self.spec().id
    }

    /// Builds the adapter, validating the entry.
    pub fn engine(&self) -> Result<TableEngine> {
        TableEngine::new(self.spec())
    }
}

impl FromStr for Provider {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bing" => Ok(Provider::Bing),
            "brave" => Ok(Provider::Brave),
            "ddg" | "duckduckgo" => Ok(Provider::DuckDuckGo),
            "baidu" => Ok(Provider::Baidu),
            "sogou" | "sougou" => Ok(Provider::Sogou),
            other => Err(SearchError::InvalidConfig(format!("Unknown engine '{}'", other))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Builds the adapter registered under `id`.
pub fn lookup(id: &str) -> Result<TableEngine> {
    id.parse::<Provider>()?.engine()
}

/// `(id, display name)` of every registered provider.
pub fn available() -> Vec<(&'static str, &'static str)> {
    Provider::ALL
        .iter()
        .map(|p| {
            let spec = p.spec();
            (spec.id, spec.name)
        })
        .collect()
}
