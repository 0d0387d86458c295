//! Knowledge-base domain: what the provider returns and what tools accept.

pub mod args;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::error::ProviderError;

/// One image reference found on a page. Identity is the `url`, compared
/// exactly as the provider returned it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub pageid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordcount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A resolved page: enough to fetch its summary, content and images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRef {
    pub pageid: u64,
    pub title: String,
    pub fullurl: String,
}

/// What `getPage` returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDetails {
    pub title: String,
    pub summary: JsonValue,
    pub content: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OnThisDay {
    #[serde(default)]
    pub selected: Vec<JsonValue>,
    #[serde(default)]
    pub events: Vec<JsonValue>,
    #[serde(default)]
    pub births: Vec<JsonValue>,
    #[serde(default)]
    pub deaths: Vec<JsonValue>,
    #[serde(default)]
    pub holidays: Vec<JsonValue>,
}

/// Options for one image listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageQuery {
    pub auto_suggest: bool,
    pub redirect: bool,
    pub limit: usize,
}

impl ImageQuery {
    /// Exact title match only.
    pub fn exact(limit: usize) -> Self {
        Self { auto_suggest: false, redirect: false, limit }
    }
}

/// The external content service. Implemented over HTTP by
/// `clients::wikipedia::WikipediaRemote`; tests substitute in-memory fakes.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResults, ProviderError>;
    async fn page(&self, title: &str) -> Result<PageRef, ProviderError>;
    async fn summary(&self, page: &PageRef) -> Result<JsonValue, ProviderError>;
    async fn content(&self, page: &PageRef) -> Result<String, ProviderError>;
    async fn images(&self, page: &PageRef, query: ImageQuery) -> Result<Vec<ImageRecord>, ProviderError>;
    async fn on_this_day(&self, month: u8, day: u8) -> Result<OnThisDay, ProviderError>;
}
