//! Search service boundary
//!
//! A request carries `{q, advanced, limit, offset}` and is posted to
//! `<base_url>/v1/index/<index_id>/search`. The reply is the GMeta envelope:
//!
//! ```json
//! {"total": 25000, "count": 10, "gmeta": [{"subject": "...", "content": [{...}]}]}
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::TransportError;
use crate::config::SearchConfig;

/// One bounded query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    pub advanced: bool,
    pub limit: usize,
    pub offset: usize,
}

/// Response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GMetaResponse {
    /// Total matches for the query, independent of `limit`
    #[serde(default)]
    pub total: usize,
    /// Entries in this page
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub gmeta: Vec<GMetaEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GMetaEntry {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: Vec<Value>,
}

impl GMetaResponse {
    /// Strips the envelope into a flat list of content documents.
    pub fn into_documents(self) -> Vec<Value> {
        self.gmeta
            .into_iter()
            .flat_map(|entry| entry.content)
            .collect()
    }
}

/// Anything that can answer a [`SearchRequest`] against an index.
pub trait SearchTransport {
    fn post_search(
        &self,
        index_id: &str,
        request: &SearchRequest,
    ) -> Result<GMetaResponse, TransportError>;
}

/// Blocking HTTP client for the search service
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    /// Builds a client from the search settings. The bearer token, if any,
    /// is read from the environment variable named by `token_env`.
    pub fn new(config: &SearchConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let token = config
            .token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty());

        let client = Client::builder()
            .user_agent(concat!("mdfpipe/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn search_url(&self, index_id: &str) -> Result<Url, TransportError> {
        let url = format!(
            "{}/v1/index/{}/search",
            self.base_url.as_str().trim_end_matches('/'),
            index_id
        );
        Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))
    }
}

impl SearchTransport for HttpTransport {
    fn post_search(
        &self,
        index_id: &str,
        request: &SearchRequest,
    ) -> Result<GMetaResponse, TransportError> {
        let mut builder = self.client.post(self.search_url(index_id)?).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        Ok(resp.json()?)
    }
}
