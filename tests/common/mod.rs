#![allow(dead_code)]

use async_trait::async_trait;
use nable_mcp::errors::ToolError;
use nable_mcp::services::config::{NableConfig, NableEnvironment};
use nable_mcp::services::http::{HttpRequest, HttpResponse, HttpTransport};
use nable_mcp::services::logger::{LogLevel, Logger};
use nable_mcp::services::nable_client::{Clock, NableClient};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const BASE_URL: &str = "http://nable.test/api/v1";
pub const NOW: i64 = 1_700_000_000;

pub fn quiet_logger() -> Logger {
    Logger::new("test").with_level(LogLevel::Error)
}

/// Settable clock shared between a test and the client under test.
#[derive(Clone)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
    pub fn at(now: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn clock(&self) -> Clock {
        let inner = self.0.clone();
        Arc::new(move || inner.load(Ordering::SeqCst))
    }
}

/// In-memory stand-in for the nAble API. Records every request; answers
/// `/tokens` from a queue (falling back to a long-lived token) and every
/// other path from its route table or an echo of the path.
pub struct FakeApi {
    requests: StdMutex<Vec<HttpRequest>>,
    token_responses: StdMutex<VecDeque<HttpResponse>>,
    default_token: HttpResponse,
    routes: StdMutex<HashMap<String, HttpResponse>>,
    unreachable: StdMutex<HashSet<String>>,
    token_delay_ms: u64,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Self::build(0)
    }

    pub fn with_token_delay(delay_ms: u64) -> Arc<Self> {
        Self::build(delay_ms)
    }

    fn build(token_delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            requests: StdMutex::new(Vec::new()),
            token_responses: StdMutex::new(VecDeque::new()),
            default_token: token_response("tok-default", NOW + 3_600),
            routes: StdMutex::new(HashMap::new()),
            unreachable: StdMutex::new(HashSet::new()),
            token_delay_ms,
        })
    }

    pub fn push_token(&self, status: u16, body: &str) {
        self.token_responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn route(&self, path: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            HttpResponse {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn make_unreachable(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(path.to_string());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn token_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|req| path_of(req) == "/tokens")
            .count()
    }

    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|req| path_of(req) != "/tokens")
            .collect()
    }

    pub fn api_paths(&self) -> Vec<String> {
        self.api_requests().iter().map(path_of).collect()
    }
}

#[async_trait]
impl HttpTransport for FakeApi {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        let path = path_of(&request);
        self.requests.lock().unwrap().push(request);

        if self.unreachable.lock().unwrap().contains(&path) {
            return Err(ToolError::transport("connection refused"));
        }

        if path == "/tokens" {
            if self.token_delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.token_delay_ms)).await;
            }
            let queued = self.token_responses.lock().unwrap().pop_front();
            return Ok(queued.unwrap_or_else(|| self.default_token.clone()));
        }

        if let Some(response) = self.routes.lock().unwrap().get(&path) {
            return Ok(response.clone());
        }
        Ok(HttpResponse {
            status: 200,
            body: serde_json::json!({ "path": path }).to_string(),
        })
    }
}

pub fn token_response(token: &str, expires_at: i64) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: serde_json::json!({ "token": token, "expires_at": expires_at }).to_string(),
    }
}

pub fn path_of(request: &HttpRequest) -> String {
    request
        .url
        .strip_prefix(BASE_URL)
        .unwrap_or(&request.url)
        .to_string()
}

/// Form field names, sorted.
pub fn form_keys(request: &HttpRequest) -> Vec<String> {
    let mut keys: Vec<String> = request.form.iter().map(|(k, _)| k.clone()).collect();
    keys.sort();
    keys
}

/// Query pairs, sorted by key.
pub fn sorted_query(request: &HttpRequest) -> Vec<(String, String)> {
    let mut pairs = request.query.clone();
    pairs.sort();
    pairs
}

pub fn test_config() -> NableConfig {
    NableConfig::new(NableEnvironment::Staging, BASE_URL, "clinic.user", "s3cret")
        .expect("test config")
}

pub fn client_with(api: Arc<FakeApi>, clock: &TestClock) -> NableClient {
    NableClient::with_transport(quiet_logger(), test_config(), api).with_clock(clock.clock())
}

pub fn client(api: Arc<FakeApi>) -> NableClient {
    client_with(api, &TestClock::at(NOW))
}
