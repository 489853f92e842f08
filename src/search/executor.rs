//! Single bounded search with retry
//!
//! Resolves the index alias, applies the limit policy, and retries
//! transport failures before giving up. The cancel token is checked before
//! every attempt.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::cancel::CancelToken;
use super::errors::{SearchError, SearchResult};
use super::transport::{SearchRequest, SearchTransport};
use crate::config::SearchConfig;
use crate::observability::Logger;
use crate::query::{clean_query, QueryBuilder};

/// Per-call options; unset fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub offset: usize,
    pub index: Option<String>,
    pub advanced: bool,
    pub retries: Option<usize>,
}

impl SearchOptions {
    pub fn advanced() -> Self {
        Self {
            advanced: true,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Metadata about one completed search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchInfo {
    pub total_query_matches: usize,
    pub index: String,
    pub index_id: String,
    /// Failed attempts before the one that succeeded
    pub retries: usize,
    pub errors: Vec<String>,
}

/// Issues queries through a [`SearchTransport`]
pub struct SearchExecutor<T: SearchTransport> {
    transport: T,
    config: SearchConfig,
    cancel: CancelToken,
}

impl<T: SearchTransport> SearchExecutor<T> {
    pub fn new(transport: T, config: SearchConfig) -> Self {
        Self {
            transport,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn hard_cap(&self) -> usize {
        self.config.hard_cap
    }

    /// Maps an alias (or the configured default) to `(name, index_id)`.
    /// Names that are not aliases are accepted only if they are UUIDs.
    pub fn resolve_index(&self, index: Option<&str>) -> SearchResult<(String, String)> {
        let name = index
            .or(self.config.default_index.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(SearchError::NoIndex)?;

        if let Some(id) = self.config.index_aliases.get(&name.to_lowercase()) {
            return Ok((name.to_string(), id.clone()));
        }
        if Uuid::parse_str(name).is_ok() {
            return Ok((name.to_string(), name.to_string()));
        }
        Err(SearchError::UnknownIndex(name.to_string()))
    }

    /// Default limit by dialect; anything above the hard cap is clamped.
    pub fn effective_limit(&self, limit: Option<usize>, advanced: bool) -> usize {
        let hard_cap = self.config.hard_cap;
        match limit {
            None if advanced => hard_cap,
            None => self.config.default_limit.min(hard_cap),
            Some(requested) if requested > hard_cap => {
                let requested_str = requested.to_string();
                let cap_str = hard_cap.to_string();
                Logger::warn(
                    "SEARCH_LIMIT_CLAMPED",
                    &[("hard_cap", &cap_str), ("requested", &requested_str)],
                );
                hard_cap
            }
            Some(requested) => requested,
        }
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<Vec<Value>> {
        self.search_with_info(query, options).map(|(docs, _)| docs)
    }

    /// Runs a built query; its advanced flag wins over `options.advanced`.
    pub fn search_query(
        &self,
        query: &QueryBuilder,
        options: &SearchOptions,
    ) -> SearchResult<(Vec<Value>, SearchInfo)> {
        let options = SearchOptions {
            advanced: options.advanced || query.is_advanced(),
            ..options.clone()
        };
        self.search_with_info(&query.clean_query(), &options)
    }

    /// Searches and also reports match count, index and retry history.
    pub fn search_with_info(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> SearchResult<(Vec<Value>, SearchInfo)> {
        let q = clean_query(query);
        if q.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let (index, index_id) = self.resolve_index(options.index.as_deref())?;

        let request = SearchRequest {
            q,
            advanced: options.advanced,
            limit: self.effective_limit(options.limit, options.advanced),
            offset: options.offset,
        };
        let retries = options.retries.unwrap_or(self.config.retries);
        let mut errors = Vec::new();

        loop {
            self.cancel.check()?;

            match self.transport.post_search(&index_id, &request) {
                Ok(response) => {
                    let info = SearchInfo {
                        total_query_matches: response.total,
                        index,
                        index_id,
                        retries: errors.len(),
                        errors,
                    };
                    return Ok((response.into_documents(), info));
                }
                Err(e) => {
                    errors.push(e.to_string());
                    if errors.len() > retries {
                        return Err(SearchError::RetriesExhausted {
                            attempts: errors.len(),
                            errors,
                        });
                    }
                    let attempt = errors.len().to_string();
                    let error = e.to_string();
                    Logger::warn(
                        "SEARCH_RETRY",
                        &[("attempt", &attempt), ("error", &error), ("index", &index)],
                    );
                }
            }
        }
    }
}
