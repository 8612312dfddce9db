//! GitHub repository search client
//!
//! Implements [`RepoSearchApi`] over the GitHub REST search endpoint.
//! Results are sorted by last update, newest first, 100 per page.

use std::sync::OnceLock;

use async_trait::async_trait;
use downstream_core::{RateLimitSignal, RemoteError, RepoSearchApi, SearchPage};
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{base_url, check_status, decode, transport, ClientError};
use crate::USER_AGENT;

/// Results requested per search page (the API maximum).
pub const SEARCH_PAGE_SIZE: u32 = 100;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// GitHub client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root, e.g. `https://api.github.com`
    pub api_url: String,
    /// Personal access token (optional; unauthenticated search is allowed)
    pub token: Option<String>,
}

impl GitHubConfig {
    pub fn new(api_url: &str) -> Self {
        GitHubConfig {
            api_url: api_url.to_string(),
            token: None,
        }
    }

    /// Set authentication token. Empty tokens are ignored.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string()).filter(|t| !t.is_empty());
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
}

/// GitHub search client
pub struct GitHubSearchClient {
    api_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl GitHubSearchClient {
    pub fn new(config: GitHubConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(GitHubSearchClient {
            api_url: base_url(&config.api_url)?,
            token: config.token,
            http_client,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search/repositories", self.api_url)
    }
}

#[async_trait]
impl RepoSearchApi for GitHubSearchClient {
    async fn search_repositories(
        &self,
        query: &str,
        page: u32,
    ) -> Result<(SearchPage, RateLimitSignal), RemoteError> {
        debug!(page, "GET {}", self.search_url());
        let mut request = self
            .http_client
            .get(self.search_url())
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[
                ("q", query.to_string()),
                ("sort", "updated".to_string()),
                ("order", "desc".to_string()),
                ("per_page", SEARCH_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport)?;
        let signal = rate_limit_signal(response.headers());
        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_last_page)
            .unwrap_or(page);

        let response = check_status(response).await?;
        let body: SearchResponse = response.json().await.map_err(decode)?;
        let items = body.items.into_iter().map(|i| i.full_name).collect();

        Ok((SearchPage::new(items, page, last_page), signal))
    }
}

/// Read the quota headers; missing or malformed headers never throttle.
pub fn rate_limit_signal(headers: &HeaderMap) -> RateLimitSignal {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let remaining = header(RATE_LIMIT_REMAINING).and_then(|v| v.trim().parse::<u64>().ok());
    let reset = header(RATE_LIMIT_RESET).and_then(|v| v.trim().parse::<i64>().ok());
    match (remaining, reset) {
        (Some(remaining), Some(reset)) => RateLimitSignal::new(remaining, reset),
        _ => RateLimitSignal::unlimited(),
    }
}

fn page_param() -> &'static Regex {
    static PAGE: OnceLock<Regex> = OnceLock::new();
    PAGE.get_or_init(|| Regex::new(r"[?&]page=(\d+)").expect("page pattern is valid"))
}

/// Page number of the `rel="last"` entry of a `Link` header.
pub fn parse_last_page(link: &str) -> Option<u32> {
    link.split(',')
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| page_param().captures(part))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
