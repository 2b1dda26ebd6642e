//! Local HTTP stub standing in for the inference endpoint and the Bot API.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Routes {
    queued: HashMap<String, VecDeque<(u16, String)>>,
    fallback: HashMap<String, (u16, String)>,
    delays: HashMap<String, VecDeque<Duration>>,
    fallback_delay: HashMap<String, Duration>,
    requests: Vec<Recorded>,
}

/// Replies are chosen by the first registered key the request path ends with.
#[derive(Clone)]
pub struct StubServer {
    routes: Arc<Mutex<Routes>>,
    pub base_url: String,
}

impl StubServer {
    pub async fn start() -> Self {
        let routes = Arc::new(Mutex::new(Routes::default()));
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&routes));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            routes,
            base_url: format!("http://{}", addr),
        }
    }

    /// Queue a one-shot reply for paths ending in `key`.
    pub fn respond(&self, key: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .queued
            .entry(key.to_string())
            .or_default()
            .push_back((status, body.into()));
    }

    /// Reply used for `key` once its queue is empty.
    pub fn respond_always(&self, key: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .fallback
            .insert(key.to_string(), (status, body.into()));
    }

    /// Hold the next reply for paths ending in `key` by `delay`.
    pub fn delay(&self, key: &str, delay: Duration) {
        self.routes
            .lock()
            .unwrap()
            .delays
            .entry(key.to_string())
            .or_default()
            .push_back(delay);
    }

    /// Hold every reply for `key` by `delay` once the one-shot delays are used up.
    pub fn delay_always(&self, key: &str, delay: Duration) {
        self.routes
            .lock()
            .unwrap()
            .fallback_delay
            .insert(key.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.routes.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, key: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(key))
            .collect()
    }

    /// Poll until `count` requests to `key` were recorded.
    pub async fn wait_for(&self, key: &str, count: usize) -> Vec<Recorded> {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let matching = self.requests_to(key);
                if matching.len() >= count {
                    return matching;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("stub did not receive the expected requests")
    }
}

async fn handle(
    State(routes): State<Arc<Mutex<Routes>>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = Recorded {
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let (reply, idle, delay) = {
        let mut routes = routes.lock().unwrap();
        routes.requests.push(recorded);

        let delay = routes
            .delays
            .iter_mut()
            .find(|(key, queue)| path.ends_with(key.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front())
            .or_else(|| {
                routes
                    .fallback_delay
                    .iter()
                    .find(|(key, _)| path.ends_with(key.as_str()))
                    .map(|(_, delay)| *delay)
            });

        let queued = routes
            .queued
            .iter_mut()
            .find(|(key, queue)| path.ends_with(key.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front());
        match queued {
            Some(reply) => (Some(reply), false, delay),
            None => (
                routes
                    .fallback
                    .iter()
                    .find(|(key, _)| path.ends_with(key.as_str()))
                    .map(|(_, reply)| reply.clone()),
                true,
                delay,
            ),
        }
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    // Keeps a polling client from spinning on empty fallbacks.
    if idle {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    match reply {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no stub registered").into_response(),
    }
}
