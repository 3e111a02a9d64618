//! Network access for the controller
//!
//! The controller never talks to a socket directly; it goes through the
//! `Network` trait so hosts can plug in a real HTTP client or an in-memory
//! origin. Non-2xx statuses are responses, not errors: only transport
//! failures (offline, DNS, timeout) surface as `AppShellError::Network`.

use crate::error::{AppShellError, AppShellResult};
use crate::http::{Method, Request, RequestKey, Response};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Abstract network interface
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform a request. Platform timeouts apply; no retries.
    async fn fetch(&self, request: &Request) -> AppShellResult<Response>;

    /// Human-readable name for display
    fn name(&self) -> &'static str;
}

/// HTTP network backed by `ureq`
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpNetwork {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            user_agent: user_agent.into(),
        }
    }

    fn apply_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        user_agent: &str,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        builder = builder.header("User-Agent", user_agent);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn fetch_blocking(
        agent: &ureq::Agent,
        user_agent: &str,
        request: &Request,
    ) -> AppShellResult<Response> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref().unwrap_or_default();

        let result = match request.method {
            Method::Get => Self::apply_headers(agent.get(url), user_agent, headers).call(),
            Method::Head => Self::apply_headers(agent.head(url), user_agent, headers).call(),
            Method::Delete => Self::apply_headers(agent.delete(url), user_agent, headers).call(),
            Method::Options => Self::apply_headers(agent.options(url), user_agent, headers).call(),
            Method::Post => Self::apply_headers(agent.post(url), user_agent, headers).send(body),
            Method::Put => Self::apply_headers(agent.put(url), user_agent, headers).send(body),
            Method::Patch => Self::apply_headers(agent.patch(url), user_agent, headers).send(body),
        };

        let mut response = result.map_err(|e| AppShellError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| AppShellError::network(url, format!("reading body: {}", e)))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> AppShellResult<Response> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let request = request.clone();

        debug!("{} {}", request.method, request.url);
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &user_agent, &request))
            .await
            .map_err(|e| AppShellError::Internal(format!("network task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// In-memory origin with an offline switch and a call counter
///
/// Unrouted URLs answer 404 like a real server would.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    routes: RwLock<HashMap<RequestKey, Response>>,
    failing: RwLock<HashSet<RequestKey>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    log: Mutex<Vec<RequestKey>>,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    /// Change the delay for requests made from now on
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Serve `response` for GET `url`
    pub fn route(&self, url: &Url, response: Response) {
        self.route_method(Method::Get, url, response);
    }

    pub fn route_method(&self, method: Method, url: &Url, response: Response) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(RequestKey::new(method, url), response);
    }

    /// Remove a route so it answers 404
    pub fn unroute(&self, url: &Url) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&RequestKey::new(Method::Get, url));
    }

    /// Make GET `url` fail at the transport level
    pub fn fail(&self, url: &Url) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(RequestKey::new(Method::Get, url));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total requests that reached this network, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests that reached this network for GET `url`
    pub fn calls_for(&self, url: &Url) -> usize {
        let key = RequestKey::new(Method::Get, url);
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|k| **k == key)
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl ScriptedNetwork {
    fn answer(&self, request: &Request, key: &RequestKey) -> AppShellResult<Response> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppShellError::network(request.url.as_str(), "offline"));
        }
        if self
            .failing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
        {
            return Err(AppShellError::network(request.url.as_str(), "connection refused"));
        }

        let response = self
            .routes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "Not Found")))
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> AppShellResult<Response> {
        let key = request.key();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.clone());

        // The origin answers with what it holds when the request arrives;
        // latency only delays delivery.
        let outcome = self.answer(request, &key);
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
