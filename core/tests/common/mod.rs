//! Shared fixtures: a scripted in-memory transport and counting event sinks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use social_core::{
    ApiError, AppContext, ClientConfig, HttpMethod, HttpRequest, HttpResponse, MemoryTokenStore,
    Navigator, Notifier, Transport,
};

pub const BASE_URL: &str = "http://api.test";

type Handler = Box<dyn Fn(HttpMethod, &str, &HttpRequest) -> HttpResponse + Send + Sync>;

/// Answers every request through one closure and records what it saw.
pub struct Scripted {
    handler: Handler,
    delay: Option<Duration>,
    seen: Mutex<Vec<HttpRequest>>,
    /// Per method and path: requests running now, and the most ever at once.
    running: Mutex<HashMap<(HttpMethod, String), (usize, usize)>>,
}

impl Scripted {
    /// `handler` receives the method and the path relative to `BASE_URL`.
    pub fn new(
        handler: impl Fn(HttpMethod, &str, &HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            seen: Mutex::new(Vec::new()),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Hold every response for `delay`, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
        self.seen
            .lock()
            .iter()
            .filter(|r| r.method == method && relative(&r.path) == path)
            .count()
    }

    /// Most requests to `method path` that were ever in flight together.
    pub fn peak_in_flight(&self, method: HttpMethod, path: &str) -> usize {
        self.running
            .lock()
            .get(&(method, path.to_string()))
            .map_or(0, |&(_, peak)| peak)
    }

    pub fn last_to(&self, method: HttpMethod, path: &str) -> Option<HttpRequest> {
        self.seen
            .lock()
            .iter()
            .rev()
            .find(|r| r.method == method && relative(&r.path) == path)
            .cloned()
    }
}

impl Transport for Scripted {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.seen.lock().push(request.clone());
        let key = (request.method, relative(&request.path).to_string());
        {
            let mut running = self.running.lock();
            let (now, peak) = running.entry(key.clone()).or_default();
            *now += 1;
            *peak = (*peak).max(*now);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((now, _)) = self.running.lock().get_mut(&key) {
            *now -= 1;
        }
        Ok((self.handler)(request.method, relative(&request.path), &request))
    }
}

fn relative(path: &str) -> &str {
    path.strip_prefix(BASE_URL).unwrap_or(path)
}

pub fn json(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}

pub fn not_found() -> HttpResponse {
    json(404, serde_json::json!({"detail": "Not Found"}))
}

pub fn user_json(id: i64, username: &str) -> Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "name": username,
        "email": format!("{username}@example.com"),
        "created_at": "2024-05-01T10:00:00",
    })
}

#[derive(Default)]
pub struct CountingNavigator(AtomicUsize);

impl CountingNavigator {
    pub fn redirects(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CountingNotifier(Mutex<Vec<ApiError>>);

impl CountingNotifier {
    pub fn notified(&self) -> Vec<ApiError> {
        self.0.lock().clone()
    }
}

impl Notifier for CountingNotifier {
    fn notify_error(&self, error: &ApiError) {
        self.0.lock().push(error.clone());
    }
}

pub struct Harness {
    pub ctx: AppContext<Scripted>,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<CountingNavigator>,
    pub notifier: Arc<CountingNotifier>,
}

impl Harness {
    pub fn new(transport: Scripted, token: Option<&str>) -> Self {
        let tokens = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::default(),
        });
        let navigator = Arc::new(CountingNavigator::default());
        let notifier = Arc::new(CountingNotifier::default());
        let ctx = AppContext::builder(transport)
            .config(ClientConfig::new(BASE_URL))
            .token_store(tokens.clone())
            .navigator(navigator.clone())
            .notifier(notifier.clone())
            .build();
        Self {
            ctx,
            tokens,
            navigator,
            notifier,
        }
    }

    /// Restore a session for token `t1`; the handler must answer `/users/me`.
    pub async fn signed_in(transport: Scripted) -> Self {
        let harness = Self::new(transport, Some("t1"));
        harness.ctx.init().await;
        assert!(harness.ctx.session().is_authenticated());
        harness
    }

    pub fn transport(&self) -> &Scripted {
        self.ctx.client().transport()
    }
}
