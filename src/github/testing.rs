// Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;

use super::transport::{RateLimitHeaders, RawResponse, Transport};
use super::GitHubError;

/// Replays queued responses per URL. The last queued response for a URL
/// repeats; unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: RawResponse) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn respond_json(&self, url: &str, value: serde_json::Value) {
        self.respond(url, RawResponse::json(StatusCode::OK, &value));
    }

    pub fn rate_limited() -> RawResponse {
        let mut response = RawResponse::new(
            StatusCode::FORBIDDEN,
            "{\"message\":\"API rate limit exceeded\"}",
        );
        response.rate_limit = RateLimitHeaders {
            limit: Some(60),
            remaining: Some(0),
            reset: Some(1_700_000_000),
            used: Some(60),
        };
        response
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _accept: &str) -> Result<RawResponse, GitHubError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let response = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| {
            RawResponse::new(StatusCode::NOT_FOUND, "{\"message\":\"Not Found\"}")
        }))
    }
}
