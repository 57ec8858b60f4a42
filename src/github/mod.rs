// GitHub ingestion layer: transport, response cache, fetch wrapper and
// retry policy.

pub mod cache;
pub mod endpoints;
pub mod fetch;
pub mod retry;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheClass, CacheEntry, CacheStore, CacheTtls, MemoryCache, ResponseCache};
pub use endpoints::RepoEndpoints;
pub use fetch::GitHubFetcher;
pub use retry::{Jitter, RetryPolicy};
pub use transport::{HttpTransport, RateLimitHeaders, RawResponse, Transport};
pub use types::{
    Comment, Commit, CommitDetail, CommitFile, Fetched, Label, Proposal, PullState,
    RateLimitSignal, SipStatus, User,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from GitHub API")]
    InvalidResponse,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}
