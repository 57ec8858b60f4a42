use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::cache::ResponseCache;
use super::transport::{RawResponse, Transport};
use super::types::{Fetched, RateLimitSignal};
use super::GitHubError;

const GITHUB_JSON: &str = "application/vnd.github.v3+json";
const RAW_TEXT: &str = "text/plain";

/// Request options that take part in the cache key.
#[derive(Serialize)]
struct RequestOptions<'a> {
    accept: &'a str,
}

fn cache_key(url: &str, accept: &str) -> String {
    let options = serde_json::to_string(&RequestOptions { accept }).unwrap_or_default();
    format!("{}-{}", url, options)
}

/// Classify an upstream response.
///
/// 2xx yields the body. A 403 with zero remaining quota, or any non-2xx
/// body mentioning "rate limit" / "too many", is a rate limit signal.
/// Everything else non-2xx is an error.
pub fn classify(response: RawResponse) -> Result<Fetched<String>, GitHubError> {
    let status = response.status;

    if status == StatusCode::FORBIDDEN && response.rate_limit.remaining == Some(0) {
        return Ok(Fetched::RateLimited(RateLimitSignal {
            reset: response.rate_limit.reset,
            retry_after: response.retry_after,
        }));
    }

    if status.is_success() {
        return Ok(Fetched::Data(response.body));
    }

    let lowered = response.body.to_lowercase();
    if lowered.contains("rate limit") || lowered.contains("too many") {
        return Ok(Fetched::RateLimited(RateLimitSignal {
            reset: response.rate_limit.reset,
            retry_after: None,
        }));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound("Repository not found".to_string()));
    }

    Err(GitHubError::Api {
        status: status.as_u16(),
        message: error_message(status, &response.body),
    })
}

/// Best-effort message from a JSON `message` field or a plain-text body.
fn error_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(message) = serde_json::from_str::<Value>(trimmed)
            .ok()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
    } else if !trimmed.is_empty() {
        return trimmed.chars().take(100).collect();
    }
    format!("GitHub API error: {}", status.as_u16())
}

/// Cache-aware, rate-limit-aware wrapper around a [`Transport`].
pub struct GitHubFetcher {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
}

impl GitHubFetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: ResponseCache) -> Self {
        Self { transport, cache }
    }

    /// Fetch a JSON document. An empty 2xx body is an empty array.
    pub async fn fetch_value(
        &self,
        url: &str,
        use_cache: bool,
    ) -> Result<Fetched<Value>, GitHubError> {
        self.fetch(url, use_cache).await
    }

    /// Fetch and decode a JSON document into `T`.
    ///
    /// Only payloads that decode are cached, so a malformed response is
    /// never replayed from the cache on retry.
    #[instrument(skip(self))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        use_cache: bool,
    ) -> Result<Fetched<T>, GitHubError> {
        let key = cache_key(url, GITHUB_JSON);
        if use_cache {
            if let Some(payload) = self.cache.read(&key, url) {
                match T::deserialize(&payload) {
                    Ok(data) => return Ok(Fetched::Data(data)),
                    Err(e) => {
                        debug!(url, error = %e, "cached payload has unexpected shape; evicting");
                        self.cache.evict(&key);
                    }
                }
            }
        }

        let response = self.transport.get(url, GITHUB_JSON).await?;
        let body = match classify(response)? {
            Fetched::Data(body) => body,
            Fetched::RateLimited(signal) => {
                debug!(reset = ?signal.reset, retry_after = ?signal.retry_after, "rate limited");
                return Ok(Fetched::RateLimited(signal));
            }
        };

        let value = if body.trim().is_empty() {
            Value::Array(Vec::new())
        } else {
            serde_json::from_str(&body).map_err(|_| {
                let preview: String = body.chars().take(200).collect();
                error!(body = %preview, "failed to parse GitHub response as JSON");
                GitHubError::InvalidResponse
            })?
        };

        let data = T::deserialize(&value).map_err(|e| {
            error!(url, error = %e, "GitHub response has unexpected shape");
            GitHubError::InvalidResponse
        })?;

        if use_cache && !body.trim().is_empty() {
            self.cache.write(&key, value);
        }
        Ok(Fetched::Data(data))
    }

    /// Fetch raw file text (markdown). Cached under the content TTL.
    #[instrument(skip(self))]
    pub async fn fetch_raw(&self, url: &str) -> Result<Fetched<String>, GitHubError> {
        let key = cache_key(url, RAW_TEXT);
        if let Some(Value::String(text)) = self.cache.read(&key, url) {
            return Ok(Fetched::Data(text));
        }

        let fetched = classify(self.transport.get(url, RAW_TEXT).await?)?;
        if let Fetched::Data(text) = &fetched {
            self.cache.write(&key, Value::String(text.clone()));
        }
        Ok(fetched)
    }
}
