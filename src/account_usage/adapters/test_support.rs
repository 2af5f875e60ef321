//! Canned-response transport for adapter and coordinator tests.

use crate::account_usage::error::{UsageError, UsageResult};
use crate::account_usage::transport::{HttpRequest, HttpResponse, HttpTransport};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap()
}

enum Canned {
    Response(HttpResponse),
    Error(fn() -> UsageError),
}

/// Matches requests by URL prefix, first registered route wins.
/// Unrouted requests fail with a transport error.
#[derive(Default)]
pub struct StubTransport {
    routes: Vec<(String, Canned)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, prefix: &str, body: &str) -> Self {
        self.respond(prefix, 200, body, &[])
    }

    pub fn respond(mut self, prefix: &str, status: u16, body: &str, headers: &[(&str, &str)]) -> Self {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        self.routes.push((
            prefix.to_string(),
            Canned::Response(HttpResponse {
                status,
                body: body.to_string(),
                headers,
            }),
        ));
        self
    }

    pub fn fail(mut self, prefix: &str, error: fn() -> UsageError) -> Self {
        self.routes.push((prefix.to_string(), Canned::Error(error)));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, request: &HttpRequest) -> UsageResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let route = self
            .routes
            .iter()
            .find(|(prefix, _)| request.url.starts_with(prefix.as_str()));
        match route {
            Some((_, Canned::Response(response))) => Ok(response.clone()),
            Some((_, Canned::Error(make))) => Err(make()),
            None => Err(UsageError::Transport(format!("no stub for {}", request.url))),
        }
    }
}
