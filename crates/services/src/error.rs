//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::SetId;

/// Errors emitted by `DocumentFetcher` implementations.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("fetching {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("fetching {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Errors emitted by `DatasetService`.
///
/// Clonable because a single failed load is observed by every caller that
/// joined the shared in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DatasetError {
    #[error("failed to fetch set '{id}': {message}")]
    Fetch { id: SetId, message: String },

    #[error("set '{id}' is invalid: {message}")]
    Invalid { id: SetId, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors emitted by `SelectionEngine`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PickError {
    #[error("no problems match the requested category and difficulty")]
    NoCandidates,
}

/// Errors emitted by `ApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("practice backend is not configured")]
    Disabled,
    #[error("practice backend rejected the request: {0}")]
    Rejected(String),
    #[error("practice backend returned an empty response")]
    EmptyResponse,
    #[error("practice backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
