//! Error types shared by the advisor crates.
//!
//! `AdvisorError` is the taxonomy surfaced by a search. Every variant maps to a fixed
//! user-visible message via [`AdvisorError::user_message`]; the detailed `Display` output
//! is for logs only. Catalog entries the model invented are filtered silently and never
//! produce an error.

use crate::openai::CompletionError;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a search query";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to get recommendations. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("upstream model call failed: {0}")]
    Upstream(#[from] CompletionError),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("search superseded by a newer query")]
    Superseded,
}

impl AdvisorError {
    /// Message stored in `SearchState.error` for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            AdvisorError::EmptyQuery => EMPTY_QUERY_MESSAGE,
            AdvisorError::Upstream(_)
            | AdvisorError::MalformedResponse(_)
            | AdvisorError::Superseded => SEARCH_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog entry #{index}: {message}")]
    InvalidEntry { index: usize, message: String },
}
