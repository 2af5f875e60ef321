//! HTTP transport used by the provider adapters.
//!
//! Adapters only ever issue single GET requests, so the seam is a small
//! blocking trait. The coordinator runs adapters on tokio's blocking pool.

use super::error::{UsageError, UsageResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-request timeout for every provider call.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// A GET request with its headers.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }
}

/// Status, body and headers of a completed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Non-2xx becomes `HttpStatus`, everything else is decoded as JSON.
    pub fn into_json(self) -> UsageResult<Value> {
        if !self.is_success() {
            return Err(UsageError::http_status(self.status, &self.body));
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Executes one request. Implementations must not retry.
pub trait HttpTransport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> UsageResult<HttpResponse>;
}

/// Production transport backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(API_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> UsageResult<HttpResponse> {
        tracing::debug!(url = %request.url, "GET");

        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(classify_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(classify_ureq_error)?;

        tracing::debug!(url = %request.url, status, bytes = body.len(), "response");
        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}

fn classify_ureq_error(error: ureq::Error) -> UsageError {
    match error {
        ureq::Error::BadUri(uri) => UsageError::InvalidResponse(format!("malformed URL: {}", uri)),
        ureq::Error::StatusCode(code) => UsageError::http_status(code, ""),
        ureq::Error::Timeout(_) => UsageError::Transport("request timed out".to_string()),
        other => UsageError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_json_content_type() {
        let req = HttpRequest::get("https://example.test/v1").bearer("sk-1");
        assert_eq!(req.url, "https://example.test/v1");
        assert!(req
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
        assert!(req
            .headers
            .contains(&("Authorization".to_string(), "Bearer sk-1".to_string())));
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let mut response = HttpResponse {
            status: 200,
            ..Default::default()
        };
        response
            .headers
            .insert("x-ratelimit-limit-requests".to_string(), "500".to_string());
        assert_eq!(response.header("X-RateLimit-Limit-Requests"), Some("500"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_into_json_non_success_is_http_status() {
        let response = HttpResponse {
            status: 429,
            body: "slow down".to_string(),
            ..Default::default()
        };
        match response.into_json() {
            Err(UsageError::HttpStatus { code, body }) => {
                assert_eq!(code, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_into_json_malformed_body_is_parsing() {
        let response = HttpResponse {
            status: 200,
            body: "<html>".to_string(),
            ..Default::default()
        };
        assert!(matches!(response.into_json(), Err(UsageError::Parsing(_))));
    }

    #[test]
    fn test_bad_url_is_invalid_response() {
        let transport = UreqTransport::new();
        let result = transport.get(&HttpRequest::get("not a url at all"));
        assert!(matches!(
            result,
            Err(UsageError::InvalidResponse(_)) | Err(UsageError::Transport(_))
        ));
    }
}
