//! HTTP client for the agent backend.
//!
//! Wraps the synchronous `ureq` client around a configured base URL. Every
//! call returns either the parsed JSON body or a single [`RequestFailed`]
//! signal: connection errors, timeouts, non-2xx statuses and unparsable
//! bodies are deliberately indistinguishable to callers. There is no retry,
//! no caching and no deduplication of identical in-flight requests.
//!
//! The [`Backend`] trait is the seam the rest of the crate talks to, so the
//! request runtime and the typed [`endpoints`] work against any transport.

pub mod endpoints;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;

use std::io::Read;

use serde_json::Value;

use crate::config::schema::ApiConfig;

/// The one failure condition surfaced by the API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request failed: {method} {path}: {detail}")]
pub struct RequestFailed {
    pub method: &'static str,
    pub path: String,
    pub detail: String,
}

impl RequestFailed {
    pub fn new(method: &'static str, path: &str, detail: impl Into<String>) -> Self {
        Self {
            method,
            path: path.to_string(),
            detail: detail.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, RequestFailed>;

/// Transport contract shared by the real client and test backends.
pub trait Backend: Send + Sync {
    fn get(&self, path: &str) -> ApiResult<Value>;

    fn post(&self, path: &str, body: &Value) -> ApiResult<Value>;

    fn delete(&self, path: &str) -> ApiResult<Value>;

    /// Liveness check: any 2xx counts, the body is ignored.
    fn check(&self, path: &str) -> ApiResult<()> {
        self.get(path).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client.
///
/// Built once from the resolved [`ApiConfig`] and shared (behind an `Arc`)
/// by every worker thread the dispatcher spawns.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Build a client from the resolved config.
    pub fn new(config: &ApiConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    /// The base URL every path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn finish(
        method: &'static str,
        path: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> ApiResult<Value> {
        let resp = result.map_err(|e| RequestFailed::new(method, path, e.to_string()))?;
        let mut body = String::new();
        resp.into_reader()
            .read_to_string(&mut body)
            .map_err(|e| RequestFailed::new(method, path, format!("failed to read body: {e}")))?;
        parse_body(&body).map_err(|e| RequestFailed::new(method, path, e))
    }
}

impl Backend for ApiClient {
    fn get(&self, path: &str) -> ApiResult<Value> {
        Self::finish("GET", path, self.agent.get(&self.url(path)).call())
    }

    fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        Self::finish("POST", path, self.agent.post(&self.url(path)).send_json(body))
    }

    fn delete(&self, path: &str) -> ApiResult<Value> {
        Self::finish("DELETE", path, self.agent.delete(&self.url(path)).call())
    }

    fn check(&self, path: &str) -> ApiResult<()> {
        self.agent
            .get(&self.url(path))
            .call()
            .map(|_| ())
            .map_err(|e| RequestFailed::new("GET", path, e.to_string()))
    }
}

/// Parse a response body. An empty body is `null` rather than an error.
fn parse_body(body: &str) -> Result<Value, String> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| format!("invalid JSON body: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
