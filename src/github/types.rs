use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const GHOST_LOGIN: &str = "ghost";

/// GitHub account that authored a pull request or comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Lifecycle status shown for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipStatus {
    /// Merged into the repository
    Live,
    /// Closed without merging
    Draft,
    /// Still open for review
    Approved,
}

impl std::fmt::Display for SipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SipStatus::Live => write!(f, "Live"),
            SipStatus::Draft => write!(f, "Draft"),
            SipStatus::Approved => write!(f, "Approved"),
        }
    }
}

/// A Sui Improvement Proposal, as mirrored from a GitHub pull request.
///
/// Snapshot of upstream state at fetch time. Comment counters are only
/// present on some upstream responses; `None` means unknown, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: PullState,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
    /// `None` when the account was deleted upstream
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(
        default,
        deserialize_with = "numeric_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub comments: Option<u64>,
    #[serde(
        default,
        deserialize_with = "numeric_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_comments: Option<u64>,
    #[serde(
        default,
        deserialize_with = "numeric_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_comments: Option<u64>,
}

impl Proposal {
    pub fn author(&self) -> &str {
        author_login(self.user.as_ref())
    }

    pub fn is_open(&self) -> bool {
        self.state == PullState::Open
    }

    pub fn status(&self) -> SipStatus {
        if self.merged_at.is_some() {
            SipStatus::Live
        } else if self.state == PullState::Closed {
            SipStatus::Draft
        } else {
            SipStatus::Approved
        }
    }

    /// Derive `total_comments` when both upstream counters are known.
    /// Otherwise the field is cleared so callers see "unknown".
    pub fn with_total_comments(mut self) -> Self {
        self.total_comments = match (self.comments, self.review_comments) {
            (Some(issue), Some(review)) => Some(issue + review),
            _ => None,
        };
        self
    }
}

/// Counters arrive as numbers, nulls or (occasionally) garbage; only keep numbers.
fn numeric_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()))
}

/// GitHub renders deleted accounts as "ghost".
fn author_login(user: Option<&User>) -> &str {
    user.map_or(GHOST_LOGIN, |user| user.login.as_str())
}

/// Issue or review comment on a proposal. The parent proposal is implied
/// by the fetch, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub html_url: String,
}

impl Comment {
    pub fn author(&self) -> &str {
        author_login(self.user.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub message: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub html_url: String,
}

/// File touched by a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub raw_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

/// Rate limit hints captured from a throttled response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSignal {
    /// Unix timestamp when the window resets
    pub reset: Option<u64>,
    /// Seconds the server asked us to wait
    pub retry_after: Option<u64>,
}

/// Outcome of a single upstream call. Throttling is data, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    RateLimited(RateLimitSignal),
}

impl<T> Fetched<T> {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Fetched::RateLimited(_))
    }

}
