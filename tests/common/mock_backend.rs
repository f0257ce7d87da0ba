//! Local view server for exercising the `reqwest` transport.
//!
//! Responses are queued per view path. The last response queued for a path
//! keeps being served; unknown paths get a 404.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use beagle_view::tree::Tree;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// What the server saw for one request.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl ViewRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ViewResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub delay: Duration,
}

impl ViewResponse {
    pub fn tree(tree: &Tree) -> Self {
        Self::raw(200, tree.to_json().expect("Tree serializes"))
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn max_age(mut self, seconds: u64) -> Self {
        self.headers
            .push(("cache-control".to_string(), format!("max-age={}", seconds)));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Default)]
struct ServerState {
    views: Arc<Mutex<HashMap<String, VecDeque<ViewResponse>>>>,
    requests: Arc<Mutex<Vec<ViewRequest>>>,
}

pub struct ViewServer {
    pub addr: SocketAddr,
    state: ServerState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl ViewServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
        let app = Router::new().fallback(serve_view).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind view server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Queues `response` for requests to `path`.
    pub fn serve(&self, path: &str, response: ViewResponse) {
        self.state
            .views
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<ViewRequest> {
        self.state.requests.lock().clone()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl Drop for ViewServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn serve_view(State(state): State<ServerState>, req: Request<Body>) -> Response<Body> {
    let path = req.uri().path().to_string();
    state.requests.lock().push(ViewRequest {
        method: req.method().to_string(),
        path: path.clone(),
        headers: req
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect(),
    });

    let response = {
        let mut views = state.views.lock();
        views.get_mut(&path).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };
    let response = response.unwrap_or_else(|| ViewResponse::raw(404, r#"{"error":"view not found"}"#));

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let mut builder = Response::builder().status(StatusCode::from_u16(response.status).unwrap());
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(response.body)).unwrap()
}
