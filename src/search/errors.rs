//! Search errors
//!
//! Transport failures are retried by the executor; everything else is
//! returned to the caller immediately.

use thiserror::Error;

/// Failure of a single request to the search service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid search service URL: {0}")]
    InvalidUrl(String),

    #[error("Search service unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a search or aggregation call
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No query specified")]
    EmptyQuery,

    #[error("No index specified")]
    NoIndex,

    #[error("Unknown index '{0}'")]
    UnknownIndex(String),

    #[error("Search failed after {attempts} attempt(s): {}", errors.join("; "))]
    RetriesExhausted { attempts: usize, errors: Vec<String> },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Search deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SearchError {
    /// Stable identifier used in CLI error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "MDF_SEARCH_EMPTY_QUERY",
            Self::NoIndex => "MDF_SEARCH_NO_INDEX",
            Self::UnknownIndex(_) => "MDF_SEARCH_UNKNOWN_INDEX",
            Self::RetriesExhausted { .. } => "MDF_SEARCH_RETRIES_EXHAUSTED",
            Self::Cancelled => "MDF_SEARCH_CANCELLED",
            Self::DeadlineExceeded => "MDF_SEARCH_DEADLINE_EXCEEDED",
            Self::Transport(_) => "MDF_SEARCH_TRANSPORT",
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
