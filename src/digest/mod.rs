// Downstream interface consumed by route handlers.
//
// Every operation here degrades instead of failing: errors and rate
// limits become empty lists, `None`, partial listings or placeholder
// content, tagged so callers can tell real data from fallbacks.

pub mod content;
pub mod listing;
pub mod markdown;

pub use content::placeholder_content;
pub use listing::{Listing, Truncation};
pub use markdown::{extract_description, strip_metadata_table};

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::config::{Config, PagingConfig};
use crate::github::{
    CacheTtls, Comment, Commit, CommitDetail, Fetched, GitHubError, GitHubFetcher, HttpTransport,
    Proposal, RepoEndpoints, ResponseCache, RetryPolicy, Transport,
};

/// Which fallback produced degraded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    PullRequestBody,
    Placeholder,
}

/// Why the proposal file could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    NoCommits,
    CommitDetailUnavailable,
    NoCandidateFile,
    RawContentUnavailable,
}

/// Genuine upstream data, or a stand-in plus the reason for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Fresh(T),
    Degraded {
        value: T,
        fallback: Fallback,
        reason: DegradeReason,
    },
}

impl<T> Resolved<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolved::Fresh(value) | Resolved::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Resolved::Fresh(value) | Resolved::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolved::Degraded { .. })
    }
}

/// Proposal data source for one repository. Build once per process and
/// share; it owns the response cache.
pub struct SipDigest {
    fetcher: GitHubFetcher,
    endpoints: RepoEndpoints,
    retry: RetryPolicy,
    paging: PagingConfig,
}

impl SipDigest {
    pub fn new(fetcher: GitHubFetcher, endpoints: RepoEndpoints) -> Self {
        Self {
            fetcher,
            endpoints,
            retry: RetryPolicy::default(),
            paging: PagingConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    /// Wire up the HTTP transport, in-memory cache and policies from config.
    pub fn from_config(config: &Config) -> Result<Self, GitHubError> {
        let token = config.github_token();
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            token.as_deref(),
            &config.github.user_agent,
            Duration::from_secs(config.github.timeout_secs),
        )?);
        let cache = ResponseCache::in_memory(CacheTtls::from(&config.cache));

        Ok(Self::new(
            GitHubFetcher::new(transport, cache),
            RepoEndpoints::from(&config.github),
        )
        .with_retry(RetryPolicy::from(&config.retry))
        .with_paging(config.paging.clone()))
    }

    async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
    ) -> Result<Fetched<T>, GitHubError> {
        self.retry
            .run(operation, || self.fetcher.fetch::<T>(url, true))
            .await
    }

    /// Fetch one proposal. When the detail call is throttled or fails, the
    /// aggregated listing is searched instead; `None` does not distinguish
    /// "missing" from "unreachable".
    #[instrument(skip(self))]
    pub async fn get_proposal(&self, id: u64) -> Option<Proposal> {
        let url = self.endpoints.pull(id);
        match self.fetch_with_retry::<Proposal>("fetch proposal", &url).await {
            Ok(Fetched::Data(proposal)) => return Some(proposal.with_total_comments()),
            Ok(Fetched::RateLimited(_)) => {
                info!(id, "rate limited; falling back to proposal listing");
            }
            Err(e) => {
                warn!(id, error = %e, "failed to fetch proposal; falling back to proposal listing");
            }
        }

        let listing = self.list_all_proposals().await;
        let found = listing.proposals.into_iter().find(|p| p.number == id);
        if found.is_some() {
            info!(id, "found proposal in listing");
        }
        found
    }

    /// Issue comments and review comments, oldest first. Both are fetched
    /// concurrently; a failed or throttled side contributes nothing.
    #[instrument(skip(self))]
    pub async fn get_comments(&self, id: u64) -> Vec<Comment> {
        let issue_url = self.endpoints.issue_comments(id);
        let review_url = self.endpoints.review_comments(id);

        let (issue, review) = tokio::join!(
            self.fetch_with_retry::<Vec<Comment>>("fetch issue comments", &issue_url),
            self.fetch_with_retry::<Vec<Comment>>("fetch review comments", &review_url),
        );

        let mut comments = comments_or_empty(id, "issue", issue);
        comments.extend(comments_or_empty(id, "review", review));
        comments.sort_by_key(|comment| comment.created_at);
        comments
    }

    /// Commits on the proposal's pull request; empty on any failure.
    #[instrument(skip(self))]
    pub async fn get_commits(&self, id: u64) -> Vec<Commit> {
        let url = self.endpoints.pull_commits(id);
        match self.fetch_with_retry::<Vec<Commit>>("fetch commits", &url).await {
            Ok(Fetched::Data(commits)) => commits,
            Ok(Fetched::RateLimited(_)) => {
                info!(id, "rate limited while fetching commits");
                Vec::new()
            }
            Err(e) => {
                warn!(id, error = %e, "failed to fetch commits");
                Vec::new()
            }
        }
    }

    /// Commit with its changed files; `None` on any failure.
    #[instrument(skip(self))]
    pub async fn get_commit_detail(&self, sha: &str) -> Option<CommitDetail> {
        let url = self.endpoints.commit(sha);
        match self
            .fetch_with_retry::<CommitDetail>("fetch commit detail", &url)
            .await
        {
            Ok(Fetched::Data(detail)) => Some(detail),
            Ok(Fetched::RateLimited(_)) => {
                info!(sha, "rate limited while fetching commit detail");
                None
            }
            Err(e) => {
                warn!(sha, error = %e, "failed to fetch commit detail");
                None
            }
        }
    }
}

fn comments_or_empty(
    id: u64,
    kind: &str,
    result: Result<Fetched<Vec<Comment>>, GitHubError>,
) -> Vec<Comment> {
    match result {
        Ok(Fetched::Data(comments)) => comments,
        Ok(Fetched::RateLimited(_)) => {
            info!(id, kind, "rate limited while fetching comments");
            Vec::new()
        }
        Err(e) => {
            warn!(id, kind, error = %e, "failed to fetch comments");
            Vec::new()
        }
    }
}
