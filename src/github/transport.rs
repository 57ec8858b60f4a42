use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::GitHubError;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Rate limit headers GitHub attaches to every API response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
    pub used: Option<u64>,
}

impl RateLimitHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: numeric_header(headers, "x-ratelimit-limit"),
            remaining: numeric_header(headers, "x-ratelimit-remaining"),
            reset: numeric_header(headers, "x-ratelimit-reset"),
            used: numeric_header(headers, "x-ratelimit-used"),
        }
    }
}

fn numeric_header(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Unclassified upstream response: status, throttling headers and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub rate_limit: RateLimitHeaders,
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            rate_limit: RateLimitHeaders::default(),
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }
}

/// Performs a single outbound GET. Implementations must not classify or
/// retry; that is the fetch wrapper's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, accept: &str) -> Result<RawResponse, GitHubError>;
}

/// `reqwest`-backed transport with GitHub default headers.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport. Without a token requests are anonymous and
    /// subject to GitHub's much lower unauthenticated rate limit.
    pub fn new(
        token: Option<&str>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();

        match token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| GitHubError::ClientBuild(e.to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                warn!("no GitHub token found; using unauthenticated requests with lower rate limits");
            }
        }
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| GitHubError::ClientBuild(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, accept: &str) -> Result<RawResponse, GitHubError> {
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = response.status();
        let rate_limit = RateLimitHeaders::from_headers(response.headers());
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        debug!(
            url,
            status = status.as_u16(),
            limit = ?rate_limit.limit,
            remaining = ?rate_limit.remaining,
            reset = ?rate_limit.reset,
            used = ?rate_limit.used,
            "rate limit info"
        );

        let body = response.text().await?;
        Ok(RawResponse {
            status,
            rate_limit,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_captures_rate_limit_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls/1"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-limit", "60")
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1700000000")
                    .insert_header("retry-after", "120")
                    .set_body_string("{\"message\":\"API rate limit exceeded\"}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            HttpTransport::new(Some("secret"), "sui-digest-test", Duration::from_secs(5)).unwrap();
        let url = format!("{}/repos/o/r/pulls/1", server.uri());
        let response = transport
            .get(&url, "application/vnd.github+json")
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.rate_limit.limit, Some(60));
        assert_eq!(response.rate_limit.remaining, Some(0));
        assert_eq!(response.rate_limit.reset, Some(1_700_000_000));
        assert_eq!(response.retry_after, Some(120));
        assert!(response.body.contains("rate limit"));
    }

    #[tokio::test]
    async fn test_anonymous_transport_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(None, "sui-digest-test", Duration::from_secs(5)).unwrap();
        let response = transport
            .get(&format!("{}/ok", server.uri()), "application/vnd.github+json")
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "[]");
        assert_eq!(response.rate_limit, RateLimitHeaders::default());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }
}
