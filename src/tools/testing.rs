//! In-memory `ContentProvider` for handler and collector tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::core::error::ProviderError;
use crate::domain::{ContentProvider, ImageQuery, ImageRecord, OnThisDay, PageRef, SearchHit, SearchResults};

#[derive(Default)]
pub struct FakeProvider {
    /// Every lookup fails with a transport error.
    failing: bool,
    /// Image batches are generated on demand, all unique `.png` urls.
    endless: bool,
    batches: Mutex<VecDeque<Result<Vec<ImageRecord>, ProviderError>>>,
    image_requests: Mutex<Vec<usize>>,
    generated: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn endless() -> Self {
        Self { endless: true, ..Self::default() }
    }

    /// Scripted image batches, served in order; once exhausted every batch is empty.
    pub fn with_batches(batches: Vec<Result<Vec<ImageRecord>, ProviderError>>) -> Self {
        Self { batches: Mutex::new(batches.into()), ..Self::default() }
    }

    /// Sizes requested from `images`, in call order.
    pub fn image_requests(&self) -> Vec<usize> {
        self.image_requests.lock().unwrap().clone()
    }

    /// Total provider calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(ProviderError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

pub fn img(url: &str) -> ImageRecord {
    ImageRecord { url: url.into(), title: format!("File:{}", url.rsplit('/').next().unwrap_or(url)) }
}

pub fn page(title: &str) -> PageRef {
    PageRef {
        pageid: 1,
        title: title.into(),
        fullurl: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
    }
}

#[async_trait]
impl ContentProvider for FakeProvider {
    async fn search(&self, query: &str) -> Result<SearchResults, ProviderError> {
        self.enter()?;
        Ok(SearchResults {
            results: vec![SearchHit {
                title: query.to_owned(),
                pageid: 1,
                snippet: None,
                wordcount: None,
                timestamp: None,
            }],
            suggestion: None,
        })
    }

    async fn page(&self, title: &str) -> Result<PageRef, ProviderError> {
        self.enter()?;
        Ok(page(title))
    }

    async fn summary(&self, page: &PageRef) -> Result<JsonValue, ProviderError> {
        self.enter()?;
        Ok(json!({ "title": page.title, "extract": format!("summary of {}", page.title) }))
    }

    async fn content(&self, page: &PageRef) -> Result<String, ProviderError> {
        self.enter()?;
        Ok(format!("content of {}", page.title))
    }

    async fn images(&self, _page: &PageRef, query: ImageQuery) -> Result<Vec<ImageRecord>, ProviderError> {
        self.enter()?;
        self.image_requests.lock().unwrap().push(query.limit);
        if self.endless {
            let first = self.generated.fetch_add(query.limit, Ordering::SeqCst);
            return Ok((first..first + query.limit)
                .map(|n| img(&format!("https://upload.example/{n}.png")))
                .collect());
        }
        self.batches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn on_this_day(&self, month: u8, day: u8) -> Result<OnThisDay, ProviderError> {
        self.enter()?;
        Ok(OnThisDay {
            events: vec![json!({ "text": format!("event on {month}/{day}"), "year": 1900 })],
            ..OnThisDay::default()
        })
    }
}
