//! Page fetch tool: URL to a fixed-size page of readable text.
//!
//! Every failure is reported in-band as a [`FetchResult`] with a status code
//! and a message the model can act on, so a bad link never aborts a run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::config::{AgentSettings, Locale};
use crate::error::Result;
use crate::extract::extract;
use crate::provider::http::shared_client;

pub const FETCH_TOOL_NAME: &str = "fetch_page";

pub const FETCH_TOOL_DESCRIPTION: &str = "指定されたURLからウェブページのコンテンツを取得するツールです。\
取得したコンテンツはタイトルと本文に分けて返されます。\
返されるデータには、状態コードとページ内容（タイトル、本文、次ページの有無）が含まれます。\
本文が長い場合は page_num を増やして続きを取得してください。";

const URL_DESCRIPTION: &str = "取得するページのURL";
const PAGE_NUM_DESCRIPTION: &str = "取得するページ番号。0以上の整数で指定します。";

pub const DEFAULT_PAGE_SIZE: usize = 3000;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Bytes of response body read before the rest is discarded.
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Status reported for faults that never produced an HTTP response.
const INTERNAL_ERROR_STATUS: u16 = 500;

/// Outcome of a fetch, serialized as `{"status": .., "page_content": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub status: u16,
    pub page_content: PageContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageContent {
    Page {
        title: String,
        content: String,
        has_next: bool,
    },
    Error {
        error_message: String,
    },
}

impl FetchResult {
    pub fn page(title: impl Into<String>, content: impl Into<String>, has_next: bool) -> Self {
        Self {
            status: 200,
            page_content: PageContent::Page {
                title: title.into(),
                content: content.into(),
                has_next,
            },
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            page_content: PageContent::Error {
                error_message: message.into(),
            },
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self.page_content, PageContent::Page { .. })
    }
}

/// Fixed failure categories, each with a localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    Unavailable,
    AnalysisFailed,
}

impl FetchFailure {
    pub fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (FetchFailure::Timeout, Locale::Ja) => {
                "タイムアウトによりページが取得できませんでした。他のページを試してください。"
            }
            (FetchFailure::Unavailable, Locale::Ja) => {
                "ページが取得できませんでした。他のページを試してください。"
            }
            (FetchFailure::AnalysisFailed, Locale::Ja) => {
                "ページの解析に失敗しました。他のページを試してください。"
            }
            (FetchFailure::Timeout, Locale::En) => {
                "The page could not be retrieved because the request timed out. Please try another page."
            }
            (FetchFailure::Unavailable, Locale::En) => {
                "The page could not be retrieved. Please try another page."
            }
            (FetchFailure::AnalysisFailed, Locale::En) => {
                "The page could not be parsed. Please try another page."
            }
        }
    }
}

/// Characters `[page_num * page_size, (page_num + 1) * page_size)` of `text`.
pub fn page_slice(text: &str, page_num: usize, page_size: usize) -> String {
    text.chars()
        .skip(page_num.saturating_mul(page_size))
        .take(page_size)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    timeout: Duration,
    page_size: usize,
    max_body_bytes: usize,
    locale: Locale,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            locale: Locale::default(),
        }
    }

    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self::new()
            .with_timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .with_page_size(settings.page_size)
            .with_locale(settings.locale)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    fn failure(&self, status: u16, failure: FetchFailure) -> FetchResult {
        FetchResult::error(status, failure.message(self.locale))
    }

    /// Fetch `url` and return page `page_num` of its readable text.
    pub async fn fetch(&self, url: &str, page_num: usize) -> FetchResult {
        let response = match shared_client().get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                warn!(url, timeout_ms = self.timeout.as_millis() as u64, "page fetch timed out");
                return self.failure(INTERNAL_ERROR_STATUS, FetchFailure::Timeout);
            }
            Err(err) => {
                warn!(url, error = %err, "page fetch failed");
                return self.failure(INTERNAL_ERROR_STATUS, FetchFailure::Unavailable);
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            debug!(url, status, "page fetch returned non-200 status");
            return self.failure(status, FetchFailure::Unavailable);
        }

        let body = match read_capped(response, self.max_body_bytes).await {
            Ok(body) => body,
            Err(err) if err.is_timeout() => {
                warn!(url, "page body read timed out");
                return self.failure(INTERNAL_ERROR_STATUS, FetchFailure::Timeout);
            }
            Err(err) => {
                warn!(url, error = %err, "page body read failed");
                return self.failure(INTERNAL_ERROR_STATUS, FetchFailure::Unavailable);
            }
        };
        let html = String::from_utf8_lossy(&body);

        match extract(&html) {
            Ok(article) => {
                let content = page_slice(&article.text, page_num, self.page_size);
                debug!(
                    url,
                    page_num,
                    total_chars = article.text.chars().count(),
                    page_chars = content.chars().count(),
                    "page fetched"
                );
                FetchResult::page(article.title, content, false)
            }
            Err(err) => {
                warn!(url, error = %err, "page extraction failed");
                self.failure(INTERNAL_ERROR_STATUS, FetchFailure::AnalysisFailed)
            }
        }
    }
}

/// Read at most `limit` bytes of the body, dropping the connection after that.
async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
) -> std::result::Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(limit, "page body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// `fetch_page`: the model-facing wrapper around [`PageFetcher`].
pub struct FetchTool {
    fetcher: Arc<PageFetcher>,
    parameters: AgentToolParameters,
}

impl FetchTool {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self {
            fetcher,
            parameters: AgentToolParameters::object()
                .string("url", URL_DESCRIPTION, true)
                .bounded_integer("page_num", PAGE_NUM_DESCRIPTION, 0, 0)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn name(&self) -> &str {
        FETCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        FETCH_TOOL_DESCRIPTION
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        let url = args.get_str("url")?;
        let page_num = args.get_usize_opt("page_num")?.unwrap_or(0);
        let result = self.fetcher.fetch(url, page_num).await;
        Ok(serde_json::to_value(result)?)
    }
}
