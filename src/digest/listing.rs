use tracing::{error, info, instrument};

use super::SipDigest;
use crate::github::{Fetched, Proposal, RateLimitSignal};

/// Why an aggregated listing stopped before the last page.
#[derive(Debug, Clone, PartialEq)]
pub enum Truncation {
    RateLimited { page: u32, signal: RateLimitSignal },
    Failed { page: u32, message: String },
}

/// Every proposal in the repository, open first then newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Set only when throttled before anything was collected.
    pub rate_limited: bool,
    pub proposals: Vec<Proposal>,
    pub truncated: Option<Truncation>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }
}

/// Open proposals first, then by creation date, newest first.
pub fn sort_proposals(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| {
        b.is_open()
            .cmp(&a.is_open())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

impl SipDigest {
    /// Aggregate all pull requests (open, closed and merged) page by page.
    ///
    /// Stops on a short or empty page. A rate limit or exhausted retries
    /// mid-way returns what was collected so far.
    #[instrument(skip(self))]
    pub async fn list_all_proposals(&self) -> Listing {
        let per_page = self.paging.per_page.max(1);
        let mut proposals: Vec<Proposal> = Vec::new();
        let mut truncated = None;
        let mut page = 1;

        info!("starting to fetch proposals");
        loop {
            let url = self.endpoints.pulls_page(page, per_page);
            match self
                .fetch_with_retry::<Vec<Proposal>>("fetch proposal page", &url)
                .await
            {
                Ok(Fetched::RateLimited(signal)) => {
                    if proposals.is_empty() {
                        info!(page, "rate limited before any proposals were fetched");
                        return Listing {
                            rate_limited: true,
                            proposals,
                            truncated: Some(Truncation::RateLimited { page, signal }),
                        };
                    }
                    info!(page, count = proposals.len(), "rate limited; returning partial list");
                    truncated = Some(Truncation::RateLimited { page, signal });
                    break;
                }
                Ok(Fetched::Data(batch)) => {
                    if batch.is_empty() {
                        info!(page, "no more data, stopping");
                        break;
                    }

                    let fetched = batch.len();
                    proposals.extend(batch.into_iter().map(Proposal::with_total_comments));
                    info!(page, fetched, total = proposals.len(), "fetched page");

                    if fetched < per_page {
                        info!("reached last page");
                        break;
                    }

                    page += 1;
                    tokio::time::sleep(self.paging.page_delay()).await;
                }
                Err(e) => {
                    error!(page, error = %e, count = proposals.len(), "giving up on proposal listing");
                    truncated = Some(Truncation::Failed {
                        page,
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        sort_proposals(&mut proposals);
        info!(count = proposals.len(), "returning proposals");
        Listing {
            rate_limited: false,
            proposals,
            truncated,
        }
    }
}
