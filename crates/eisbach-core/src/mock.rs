//! Mock transport implementation for testing.
//!
//! This module provides a scripted [`Transport`] that can be used for unit
//! testing without a running backend.
//!
//! # Features
//!
//! - **Scripted responses**: sticky per-route responses plus one-shot queues
//! - **Failure injection**: fail every call, or the next `n` calls
//! - **Latency simulation**: global or per-response delays
//! - **Call recording**: inspect paths, query parameters and POST bodies

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::client::{Query, Transport};
use crate::error::{Error, Result};

/// A scripted response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 2xx with this body.
    Body(String),
    /// Non-2xx status.
    Status(u16),
    /// Connection failure.
    Unreachable,
    /// Wait, then answer with the inner response.
    Delayed(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// 2xx with `value` encoded as JSON.
    pub fn json<T: Serialize>(value: &T) -> Self {
        MockResponse::Body(serde_json::to_string(value).unwrap_or_default())
    }

    /// Delay this response.
    pub fn after(self, delay: Duration) -> Self {
        MockResponse::Delayed(delay, Box::new(self))
    }
}

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// A mock backend for testing.
///
/// # Example
///
/// ```
/// use eisbach_core::{MockResponse, MockTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::new();
/// transport.on_get("/conditions/water/temperature", MockResponse::Body(r#"{"water_temperature":7.1}"#.into()));
///
/// let body = transport.get("/conditions/water/temperature", &[]).await.unwrap();
/// assert!(body.contains("7.1"));
/// assert_eq!(transport.call_count("/conditions/water/temperature"), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    sticky: Mutex<HashMap<String, MockResponse>>,
    queued: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
    should_fail: AtomicBool,
    remaining_failures: AtomicU32,
}

fn route(method: &str, path: &str) -> String {
    format!("{method} {path}")
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `GET path` with `response` unless a one-shot is queued.
    pub fn on_get(&self, path: &str, response: MockResponse) {
        self.set_sticky(route("GET", path), response);
    }

    /// Answer every `POST path` with `response` unless a one-shot is queued.
    pub fn on_post(&self, path: &str, response: MockResponse) {
        self.set_sticky(route("POST", path), response);
    }

    /// Answer the next `GET path` with `response`.
    pub fn enqueue_get(&self, path: &str, response: MockResponse) {
        self.enqueue(route("GET", path), response);
    }

    /// Answer the next `POST path` with `response`.
    pub fn enqueue_post(&self, path: &str, response: MockResponse) {
        self.enqueue(route("POST", path), response);
    }

    fn set_sticky(&self, key: String, response: MockResponse) {
        lock(&self.sticky).insert(key, response);
    }

    fn enqueue(&self, key: String, response: MockResponse) {
        lock(&self.queued).entry(key).or_default().push_back(response);
    }

    /// Fail all calls until reset.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Fail the next `count` calls, then answer normally.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls (any method) made to `path`.
    pub fn call_count(&self, path: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.path == path).count()
    }

    /// Total number of calls.
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// JSON bodies posted to `path`, oldest first.
    pub fn posted_bodies(&self, path: &str) -> Vec<serde_json::Value> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == "POST" && c.path == path)
            .filter_map(|c| c.body.clone())
            .collect()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    async fn respond(&self, call: RecordedCall) -> Result<String> {
        let key = route(call.method, &call.path);
        let url = format!("mock://{}", call.path);
        let operation = key.clone();
        lock(&self.calls).push(call);

        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::Unreachable(operation));
        }
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::Unreachable(operation));
        }

        let scripted = {
            let queued = lock(&self.queued).get_mut(&key).and_then(VecDeque::pop_front);
            queued.or_else(|| lock(&self.sticky).get(&key).cloned())
        };

        let mut response = scripted.unwrap_or(MockResponse::Status(404));
        loop {
            match response {
                MockResponse::Body(body) => return Ok(body),
                MockResponse::Status(status) => {
                    return Err(Error::Status { status, url });
                }
                MockResponse::Unreachable => return Err(Error::Unreachable(operation)),
                MockResponse::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    response = *inner;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<String> {
        self.respond(RecordedCall {
            method: "GET",
            path: path.to_string(),
            query: query.to_vec(),
            body: None,
        })
        .await
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        self.respond(RecordedCall {
            method: "POST",
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
        .await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_route_is_404() {
        let transport = MockTransport::new();
        let err = transport.get("/nope", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
        assert_eq!(transport.call_count("/nope"), 1);
    }

    #[tokio::test]
    async fn test_queued_responses_take_precedence() {
        let transport = MockTransport::new();
        transport.on_get("/x", MockResponse::Body("sticky".into()));
        transport.enqueue_get("/x", MockResponse::Body("first".into()));
        transport.enqueue_get("/x", MockResponse::Status(503));

        assert_eq!(transport.get("/x", &[]).await.unwrap(), "first");
        assert!(transport.get("/x", &[]).await.is_err());
        assert_eq!(transport.get("/x", &[]).await.unwrap(), "sticky");
        assert_eq!(transport.get("/x", &[]).await.unwrap(), "sticky");
    }

    #[tokio::test]
    async fn test_methods_are_routed_separately() {
        let transport = MockTransport::new();
        transport.on_post("/surfers", MockResponse::Body("{}".into()));
        assert!(transport.get("/surfers", &[]).await.is_err());
        assert!(
            transport
                .post_json("/surfers", &serde_json::json!({"count": 5}))
                .await
                .is_ok()
        );
        assert_eq!(
            transport.posted_bodies("/surfers"),
            vec![serde_json::json!({"count": 5})]
        );
    }

    #[tokio::test]
    async fn test_transient_failures() {
        let transport = MockTransport::new();
        transport.on_get("/x", MockResponse::Body("ok".into()));
        transport.set_transient_failures(2);

        assert!(matches!(
            transport.get("/x", &[]).await,
            Err(Error::Unreachable(_))
        ));
        assert!(transport.get("/x", &[]).await.is_err());
        assert_eq!(transport.get("/x", &[]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_should_fail() {
        let transport = MockTransport::new();
        transport.on_get("/x", MockResponse::Body("ok".into()));
        transport.set_should_fail(true);
        assert!(transport.get("/x", &[]).await.is_err());
        transport.set_should_fail(false);
        assert!(transport.get("/x", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_records_query() {
        let transport = MockTransport::new();
        let query = vec![("hour".to_string(), "17".to_string())];
        let _ = transport.get("/surfers/predict", &query).await;
        assert_eq!(transport.calls()[0].query, query);

        transport.reset_calls();
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_response() {
        let transport = MockTransport::new();
        transport.on_get("/slow", MockResponse::Body("done".into()).after(Duration::from_secs(5)));

        let start = tokio::time::Instant::now();
        assert_eq!(transport.get("/slow", &[]).await.unwrap(), "done");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
