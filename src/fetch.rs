// src/fetch.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use crate::config::Config;
use crate::models::{Token, TokenPage};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("all {attempts} endpoints failed, last error: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<FetchError>,
    },
}

/// Query parameters of `GET /api/tokens`. The remote sort and paging are
/// advisory; the dashboard sorts and aggregates locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    pub limit: u32,
    pub page: u32,
    pub sort_by: String,
    pub sort_order: String,
    pub hide_imported: bool,
}

impl Default for TokenQuery {
    fn default() -> Self {
        Self {
            limit: 1000,
            page: 1,
            sort_by: "createdAt".to_string(),
            sort_order: "asc".to_string(),
            hide_imported: true,
        }
    }
}

impl TokenQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn to_url(&self, base: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(base)?;
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string())
            .append_pair("page", &self.page.to_string())
            .append_pair("sortBy", &self.sort_by)
            .append_pair("sortOrder", &self.sort_order)
            .append_pair("hideImported", if self.hide_imported { "1" } else { "0" });
        Ok(url)
    }
}

/// Anything that can hand back a fresh token list.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, FetchError>;
}

/// HTTP client for the token listing API, optionally routed through a
/// chain of intermediary prefixes before the direct URL.
#[derive(Debug, Clone)]
pub struct TokenApi {
    client: Client,
    base_url: String,
    proxies: Vec<String>,
}

impl TokenApi {
    pub fn new(base_url: &str, proxies: Vec<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            proxies,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FetchError> {
        Self::new(
            &cfg.api_url,
            cfg.proxies.clone(),
            Duration::from_secs(cfg.fetch_timeout_secs),
        )
    }

    /// `prefix` followed by the percent-encoded target URL.
    pub fn proxied_url(prefix: &str, target: &Url) -> String {
        let encoded: String = form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();
        format!("{prefix}{encoded}")
    }

    async fn get_page(&self, url: &str) -> Result<TokenPage, FetchError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let text = resp.text().await?;
        debug!("📩 Token list response: {} bytes", text.len());

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl TokenSource for TokenApi {
    async fn fetch_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, FetchError> {
        let target = query.to_url(&self.base_url)?;
        info!("📡 Fetching tokens → {}", target);

        for prefix in &self.proxies {
            let url = Self::proxied_url(prefix, &target);
            match self.get_page(&url).await {
                Ok(page) => {
                    info!("Fetched {} tokens via {}", page.tokens.len(), prefix);
                    return Ok(page.tokens);
                }
                Err(e) => warn!("⚠️ Token fetch via {} failed: {}", prefix, e),
            }
        }

        // direct request is the last resort
        match self.get_page(target.as_str()).await {
            Ok(page) => {
                info!("Fetched {} tokens", page.tokens.len());
                Ok(page.tokens)
            }
            Err(e) if self.proxies.is_empty() => Err(e),
            Err(e) => Err(FetchError::Exhausted {
                attempts: self.proxies.len() + 1,
                last: Box::new(e),
            }),
        }
    }
}
