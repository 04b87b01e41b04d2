//! In-process fake HTTP client for unit tests
//!
//! [`FakeHttpClient`] answers every request with a caller-supplied handler
//! and records what was sent. The returned [`RequestLog`] lets the test
//! inspect the recorded requests after the code under test has run.
//!
//! ```text
//! code under test --execute()--> FakeHttpClient --handler(&req)--> HttpResponse
//!                                      |
//!                                      +--> RequestLog (test reads)
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, HttpResponse};

type Handler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Scripted [`HttpClient`] used by unit tests.
pub struct FakeHttpClient {
    handler: Arc<Handler>,
    delay: Option<Duration>,
    log: RequestLog,
}

/// Shared record of every request a [`FakeHttpClient`] received.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RequestLog {
    /// Returns a copy of all recorded requests in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    /// Counts recorded requests whose URL ends with `suffix`.
    pub fn count_to(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .expect("request log poisoned")
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }

    fn push(&self, request: HttpRequest) {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request);
    }
}

impl FakeHttpClient {
    /// Creates a fake that answers immediately with `handler`.
    pub fn new<F>(handler: F) -> (Self, RequestLog)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        let log = RequestLog::default();
        let client = Self {
            handler: Arc::new(handler),
            delay: None,
            log: log.clone(),
        };
        (client, log)
    }

    /// Creates a fake that sleeps for `delay` before answering.
    pub fn with_delay<F>(delay: Duration, handler: F) -> (Self, RequestLog)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        let (mut client, log) = Self::new(handler);
        client.delay = Some(delay);
        (client, log)
    }
}

impl fmt::Debug for FakeHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeHttpClient")
            .field("delay", &self.delay)
            .field("log", &self.log)
            .finish()
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.log.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok((self.handler)(request))
    }
}

/// Builds a JSON response with the given status and body.
pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}
