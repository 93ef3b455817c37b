//! Web search tool backed by a pluggable search backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::config::AgentSettings;
use crate::error::{Result, SiftError};
use crate::extract::{collapse_whitespace, Document};
use crate::provider::http::shared_client;
use crate::util::timeout::with_optional_timeout;

pub const SEARCH_TOOL_NAME: &str = "search_web";

pub const SEARCH_TOOL_DESCRIPTION: &str = "DuckDuckGoでウェブ検索を行うツールです。\
指定されたクエリで検索し、各結果のタイトル、概要（スニペット）、URLを返します。\
質問の内容に最も適した言語でクエリを作成してください。\
検索結果だけでは情報が不十分な場合は、fetch_page でページ本文を取得してください。";

const QUERY_DESCRIPTION: &str = "検索したいキーワードを入力してください";

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_REGION: &str = "jp-jp";
pub const DEFAULT_DDG_BASE_URL: &str = "https://lite.duckduckgo.com";

/// One search hit as shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SafeSearch {
    On,
    Moderate,
    #[default]
    Off,
}

impl SafeSearch {
    /// DuckDuckGo `kp` parameter value.
    pub fn ddg_param(self) -> &'static str {
        match self {
            SafeSearch::On => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }
}

/// Parameters for a single backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub region: String,
    pub safe_search: SafeSearch,
}

/// A web search engine.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Issue one query; results in engine ranking order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResultItem>>;
}

/// DuckDuckGo's JavaScript-free "lite" endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoLite {
    base_url: String,
}

impl Default for DuckDuckGoLite {
    fn default() -> Self {
        Self::new(DEFAULT_DDG_BASE_URL)
    }
}

impl DuckDuckGoLite {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoLite {
    fn name(&self) -> &str {
        "duckduckgo-lite"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResultItem>> {
        let url = format!("{}/lite/", self.base_url);
        let response = shared_client()
            .post(&url)
            .form(&[
                ("q", request.query.as_str()),
                ("kl", request.region.as_str()),
                ("kp", request.safe_search.ddg_param()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiftError::Search(format!(
                "DuckDuckGo returned status {}",
                status.as_u16()
            )));
        }
        let body = response.text().await?;
        Ok(parse_lite_results(&body))
    }
}

/// Pull `(title, snippet, url)` rows out of a lite results page.
///
/// A link owns the first snippet between it and the next link; sponsored
/// rows are dropped.
pub fn parse_lite_results(html: &str) -> Vec<SearchResultItem> {
    let doc = Document::parse(html);
    // Node ids are assigned in document order.
    let links: Vec<_> = doc
        .elements("a")
        .filter(|&a| doc.has_class(a, "result-link"))
        .collect();
    let snippets: Vec<_> = doc
        .elements("td")
        .filter(|&td| doc.has_class(td, "result-snippet"))
        .collect();

    links
        .iter()
        .enumerate()
        .filter_map(|(i, &link)| {
            let href = doc.attr(link, "href")?;
            if href.contains("duckduckgo.com/y.js") {
                return None;
            }
            let next_link = links.get(i + 1).copied().unwrap_or(usize::MAX);
            let snippet = snippets
                .iter()
                .find(|&&td| td > link && td < next_link)
                .map(|&td| collapse_whitespace(&doc.text_content(td)))
                .unwrap_or_default();
            Some(SearchResultItem {
                title: collapse_whitespace(&doc.text_content(link)),
                snippet,
                url: resolve_result_url(href),
            })
        })
        .collect()
}

/// Unwrap `/l/?uddg=<target>` redirects and make protocol-relative links absolute.
fn resolve_result_url(href: &str) -> String {
    let Ok(base) = reqwest::Url::parse("https://duckduckgo.com/") else {
        return href.to_string();
    };
    let Ok(url) = base.join(href) else {
        return href.to_string();
    };
    let is_redirect = url
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if is_redirect {
        if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    url.to_string()
}

/// Search front-end holding the fixed region and safe-search policy.
pub struct WebSearch {
    backend: Arc<dyn SearchBackend>,
    region: String,
    safe_search: SafeSearch,
    max_results: usize,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for WebSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearch")
            .field("backend", &self.backend.name())
            .field("region", &self.region)
            .field("safe_search", &self.safe_search)
            .field("max_results", &self.max_results)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebSearch {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            region: DEFAULT_REGION.to_string(),
            safe_search: SafeSearch::Off,
            max_results: DEFAULT_MAX_RESULTS,
            timeout: None,
        }
    }

    pub fn duckduckgo() -> Self {
        Self::new(Arc::new(DuckDuckGoLite::default()))
    }

    pub fn from_settings(backend: Arc<dyn SearchBackend>, settings: &AgentSettings) -> Self {
        Self::new(backend)
            .with_region(settings.search_region.clone())
            .with_safe_search(settings.safe_search)
            .with_max_results(settings.search_max_results)
            .with_timeout(settings.search_timeout_secs.map(Duration::from_secs))
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = safe_search;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default result bound used by the tool.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Run `query` once and keep at most `max_results` hits.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResultItem>> {
        let request = SearchRequest {
            query: query.to_string(),
            region: self.region.clone(),
            safe_search: self.safe_search,
        };
        let mut items =
            with_optional_timeout(self.timeout, self.backend.search(&request)).await?;
        items.truncate(max_results);
        debug!(
            backend = self.backend.name(),
            query,
            results = items.len(),
            "web search completed"
        );
        Ok(items)
    }
}

/// `search_web`: the model-facing wrapper around [`WebSearch`].
pub struct SearchTool {
    search: Arc<WebSearch>,
    parameters: AgentToolParameters,
}

impl SearchTool {
    pub fn new(search: Arc<WebSearch>) -> Self {
        Self {
            search,
            parameters: AgentToolParameters::object()
                .string("query", QUERY_DESCRIPTION, true)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_TOOL_DESCRIPTION
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        let query = args.get_str("query")?;
        let items = self.search.search(query, self.search.max_results()).await?;
        Ok(serde_json::to_value(items)?)
    }
}
