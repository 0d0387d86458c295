use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Instant;

use crate::core::error::ProviderError;
use crate::domain::{ContentProvider, ImageQuery, ImageRecord, OnThisDay, PageRef, SearchHit, SearchResults};
use crate::infra::config::ProviderConfig;
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::runtime::limits::{make_http_client_with, retry_async};

const SEARCH_LIMIT: &str = "10";

/// Wikipedia over the MediaWiki Action API (`/w/api.php`) and the REST v1
/// API (`/api/rest_v1`).
#[derive(Clone)]
pub struct WikipediaRemote {
    base: String,
    user_agent: String,
    http: Client,
    retries: u32,
}

impl WikipediaRemote {
    /// Default settings against an explicit base URL.
    pub fn new(base: impl Into<String>) -> Result<Self, ProviderError> {
        Self::from_config(&ProviderConfig { base_url: Some(base.into()), ..ProviderConfig::default() })
    }

    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = make_http_client_with(cfg)?;
        Ok(Self {
            base: cfg.base_url(),
            user_agent: cfg.user_agent.clone(),
            http,
            retries: cfg.retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        Url::parse(&format!("{}{}", self.base, path)).map_err(|e| ProviderError::Transport(e.to_string()))
    }

    /// `/w/api.php` with the common parameters plus `params`.
    fn action_url(&self, params: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self.endpoint("/w/api.php")?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("formatversion", "2")
            .extend_pairs(params);
        Ok(url)
    }

    /// `/api/rest_v1/<segments...>`, each segment percent-encoded.
    fn rest_url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.endpoint("/api/rest_v1")?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Transport(format!("cannot-be-a-base url: {}", self.base)))?
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, op: &'static str, url: Url) -> Result<T, ProviderError> {
        tracing::debug!(op, endpoint = %url, "wikipedia request");
        let req_id = generate_request_id();
        let start = Instant::now();
        let res: Result<T, ProviderError> = retry_async(self.retries, ProviderError::is_retryable, |_| {
            let http = self.http.clone();
            let url = url.clone();
            let req_id = req_id.clone();
            let user_agent = self.user_agent.clone();
            async move {
                let (builder, _rid) = add_standard_headers(http.get(url.clone()), Some(req_id), &user_agent);
                let resp = builder.send().await?;
                let status = resp.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(ProviderError::NotFound(url.path().to_owned()));
                }
                if !status.is_success() {
                    return Err(ProviderError::Status(status.as_u16()));
                }
                resp.json::<T>().await.map_err(|e| ProviderError::Decode(e.to_string()))
            }
        })
        .await;
        match &res {
            Ok(_) => {
                let elapsed_ms = start.elapsed().as_millis() as f64;
                crate::infra::logging::log_metric(op, "remote_latency_ms", elapsed_ms);
            }
            Err(e) => {
                tracing::warn!(op, error = %e, "wikipedia request failed");
                crate::infra::logging::log_metric(op, "remote_error_total", 1.0);
            }
        }
        res
    }

    async fn query<T: DeserializeOwned + Default>(&self, op: &'static str, params: &[(&str, &str)]) -> Result<T, ProviderError> {
        let envelope: QueryEnvelope<T> = self.fetch(op, self.action_url(params)?).await?;
        if let Some(err) = envelope.error {
            return Err(ProviderError::Api { code: err.code, info: err.info });
        }
        // No `query` key at all means "nothing matched", e.g. a page without images.
        Ok(envelope.query.unwrap_or_default())
    }
}

#[async_trait]
impl ContentProvider for WikipediaRemote {
    async fn search(&self, query: &str) -> Result<SearchResults, ProviderError> {
        let q: SearchQuery = self
            .query(
                "wiki.search",
                &[("list", "search"), ("srsearch", query), ("srlimit", SEARCH_LIMIT), ("srinfo", "suggestion")],
            )
            .await?;
        Ok(SearchResults {
            results: q.search,
            suggestion: q.searchinfo.and_then(|i| i.suggestion),
        })
    }

    async fn page(&self, title: &str) -> Result<PageRef, ProviderError> {
        let q: PagesQuery<InfoPage> = self
            .query(
                "wiki.page",
                &[("prop", "info"), ("inprop", "url"), ("redirects", "1"), ("titles", title)],
            )
            .await?;
        let page = q
            .pages
            .into_iter()
            .next()
            .filter(|p| !p.missing && !p.invalid)
            .ok_or_else(|| ProviderError::NotFound(title.to_owned()))?;
        Ok(PageRef {
            pageid: page.pageid.unwrap_or_default(),
            fullurl: page.fullurl.unwrap_or_default(),
            title: page.title,
        })
    }

    async fn summary(&self, page: &PageRef) -> Result<JsonValue, ProviderError> {
        let title = page.title.replace(' ', "_");
        let url = self.rest_url(&["page", "summary", &title])?;
        self.fetch("wiki.summary", url).await
    }

    async fn content(&self, page: &PageRef) -> Result<String, ProviderError> {
        let pageid = page.pageid.to_string();
        let q: PagesQuery<ExtractPage> = self
            .query(
                "wiki.content",
                &[("prop", "extracts"), ("explaintext", "1"), ("pageids", &pageid)],
            )
            .await?;
        q.pages
            .into_iter()
            .find(|p| !p.missing)
            .map(|p| p.extract.unwrap_or_default())
            .ok_or_else(|| ProviderError::NotFound(page.title.clone()))
    }

    async fn images(&self, page: &PageRef, query: ImageQuery) -> Result<Vec<ImageRecord>, ProviderError> {
        let title = if query.auto_suggest {
            self.search(&page.title)
                .await?
                .suggestion
                .unwrap_or_else(|| page.title.clone())
        } else {
            page.title.clone()
        };
        let limit = query.limit.to_string();
        let mut params = vec![
            ("generator", "images"),
            ("gimlimit", limit.as_str()),
            ("prop", "imageinfo"),
            ("iiprop", "url"),
            ("titles", title.as_str()),
        ];
        if query.redirect {
            params.push(("redirects", "1"));
        }
        let q: PagesQuery<ImagePage> = self.query("wiki.images", &params).await?;
        Ok(q
            .pages
            .into_iter()
            .filter_map(|p| {
                let url = p.imageinfo.into_iter().find_map(|i| i.url)?;
                Some(ImageRecord { url, title: p.title })
            })
            .collect())
    }

    async fn on_this_day(&self, month: u8, day: u8) -> Result<OnThisDay, ProviderError> {
        let (mm, dd) = (format!("{month:02}"), format!("{day:02}"));
        let url = self.rest_url(&["feed", "onthisday", "all", &mm, &dd])?;
        self.fetch("wiki.on_this_day", url).await
    }
}

// --- Action API wire shapes (formatversion=2) ---

#[derive(Deserialize)]
struct QueryEnvelope<T> {
    #[serde(default)]
    query: Option<T>,
    #[serde(default)]
    error: Option<ApiErrorWire>,
}

#[derive(Deserialize)]
struct ApiErrorWire {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize, Default)]
struct SearchQuery {
    #[serde(default)]
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchInfo {
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Deserialize)]
struct PagesQuery<P> {
    #[serde(default = "Vec::new")]
    pages: Vec<P>,
}

impl<P> Default for PagesQuery<P> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

#[derive(Deserialize)]
struct InfoPage {
    title: String,
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
}

#[derive(Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

#[derive(Deserialize)]
struct ImagePage {
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfoWire>,
}

#[derive(Deserialize)]
struct ImageInfoWire {
    #[serde(default)]
    url: Option<String>,
}
