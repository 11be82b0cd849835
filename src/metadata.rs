//! Page metadata (title and description) for a URL.
//!
//! Resolution never fails: network errors, error statuses and non-HTML
//! responses degrade to fixed placeholder text that asks the user to fill
//! in a custom title and description instead.

use std::io::Read;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::validate::{clamp_chars, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
use crate::{CardConfig, Error, Result};

pub const UNREACHABLE_TITLE: &str = "未能访问的网页";
pub const UNSUPPORTED_TITLE: &str = "不支持的网页类型";
pub const MISSING_TITLE: &str = "未能获取网页标题";
pub const MISSING_DESCRIPTION: &str = "未能获取网页描述";

/// Bytes of a page body that are parsed. Titles and descriptions sit near
/// the top of a document.
pub const MAX_BODY_BYTES: u64 = 512 * 1024;

const UNREACHABLE_DESCRIPTION: &str =
    "该网页暂时无法访问，您可以点击上方的\"自定义标题和描述\"来编辑显示内容";
const ERROR_STATUS_DESCRIPTION: &str =
    "该网页返回了错误状态，您可以点击上方的\"自定义标题和描述\"来编辑显示内容";
const UNSUPPORTED_DESCRIPTION: &str =
    "该链接不是一个网页，您可以点击上方的\"自定义标题和描述\"来编辑显示内容";

/// Title and description shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
}

impl PageInfo {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Why a page could not be read. Only ever turned into placeholder text.
#[derive(Error, Debug)]
pub enum MetadataFetchError {
    #[error("request failed: {0}")]
    Unreachable(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("not an HTML page (content type {0:?})")]
    NotHtml(Option<String>),
}

impl MetadataFetchError {
    pub fn fallback(&self) -> PageInfo {
        match self {
            MetadataFetchError::Unreachable(_) => {
                PageInfo::new(UNREACHABLE_TITLE, UNREACHABLE_DESCRIPTION)
            }
            MetadataFetchError::Status(_) => {
                PageInfo::new(UNREACHABLE_TITLE, ERROR_STATUS_DESCRIPTION)
            }
            MetadataFetchError::NotHtml(_) => {
                PageInfo::new(UNSUPPORTED_TITLE, UNSUPPORTED_DESCRIPTION)
            }
        }
    }
}

/// Produces a title and description for a URL. Must not fail.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, url: &Url) -> PageInfo;
}

/// Fetches the page over HTTP and scrapes it.
pub struct HttpMetadataResolver {
    client: Client,
    user_agent: String,
}

impl HttpMetadataResolver {
    pub fn new(config: &CardConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    fn fetch(&self, url: &Url) -> std::result::Result<String, MetadataFetchError> {
        let resp = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .map_err(|e| MetadataFetchError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MetadataFetchError::Status(resp.status().as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        match content_type {
            Some(ref ct) if ct.contains("text/html") => {}
            other => return Err(MetadataFetchError::NotHtml(other)),
        }

        read_capped(resp, MAX_BODY_BYTES)
    }
}

/// Read at most `limit` bytes of a body as (lossy) UTF-8.
pub fn read_capped(
    body: impl Read,
    limit: u64,
) -> std::result::Result<String, MetadataFetchError> {
    let mut buf = Vec::new();
    body.take(limit)
        .read_to_end(&mut buf)
        .map_err(|e| MetadataFetchError::Unreachable(format!("Failed to read body: {}", e)))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl MetadataResolver for HttpMetadataResolver {
    fn resolve(&self, url: &Url) -> PageInfo {
        match self.fetch(url) {
            Ok(html) => {
                let info = extract_page_info(&html);
                debug!("Resolved {}: {:?}", url, info.title);
                info
            }
            Err(e) => {
                warn!("Falling back to placeholder metadata for {}: {}", url, e);
                e.fallback()
            }
        }
    }
}

/// Pull a title and description out of an HTML document, clamped to the
/// card limits.
pub fn extract_page_info(html: &str) -> PageInfo {
    let document = Html::parse_document(html);

    let title = first_text(&document, "title")
        .or_else(|| meta_content(&document, r#"meta[property="og:title"]"#))
        .or_else(|| first_text(&document, "h1"))
        .unwrap_or_else(|| MISSING_TITLE.to_string());

    let description = meta_content(&document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#))
        .or_else(|| first_text(&document, "p"))
        .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());

    PageInfo {
        title: clamp_chars(&title, MAX_TITLE_CHARS),
        description: clamp_chars(&description, MAX_DESCRIPTION_CHARS),
    }
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let node = document.select(&selector).next()?;
    non_empty(&node.text().collect::<String>())
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .find_map(|node| node.value().attr("content").and_then(non_empty))
}

/// Collapse whitespace runs; `None` when nothing is left.
fn non_empty(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
