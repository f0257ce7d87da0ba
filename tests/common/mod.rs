//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use async_trait::async_trait;
use beagle_view::cache::{CacheStore, MemoryStorage};
use beagle_view::config::{CacheConfig, Config};
use beagle_view::network::{HttpClient, HttpRequest, HttpResponse, TransportError};
use beagle_view::service::BeagleService;
use beagle_view::tree::Tree;
use beagle_view::TreeLoader;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::subscriber::DefaultGuard;

pub const BASE_URL: &str = "http://views.test";

/// What the scripted transport answers with.
pub enum Scripted {
    Respond(HttpResponse),
    Fail(String),
}

/// In-memory transport answering from a queue and recording every call.
///
/// An empty queue answers with a connection failure.
#[derive(Default)]
pub struct MockHttpClient {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, HttpRequest)>>,
}

impl MockHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: HttpResponse) {
        self.script.lock().push_back(Scripted::Respond(response));
    }

    pub fn respond_tree(&self, tree: &Tree) {
        self.respond(HttpResponse::new(200, tree.to_json().unwrap()));
    }

    pub fn fail(&self, message: &str) {
        self.script.lock().push_back(Scripted::Fail(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, HttpRequest)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn fetch(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().push((url.to_string(), request.clone()));
        match self.script.lock().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(TransportError::Connection(message)),
            None => Err(TransportError::Connection("no scripted response".to_string())),
        }
    }
}

pub fn config() -> Config {
    Config::with_base_url(BASE_URL)
}

pub fn loader(http: Arc<MockHttpClient>, max_age_seconds: u64) -> (TreeLoader, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let cache_config = CacheConfig {
        max_age_seconds,
        ..CacheConfig::default()
    };
    let cache = CacheStore::new(storage.clone(), &cache_config);
    (TreeLoader::new(http, cache), storage)
}

pub fn service(http: Arc<MockHttpClient>) -> BeagleService {
    BeagleService::new(config(), http, Arc::new(MemoryStorage::new()))
}

pub fn text(id: &str, text: &str) -> Tree {
    Tree::new("beagle:text")
        .with_id(id)
        .with_prop("text", serde_json::json!(text))
}

pub fn container(id: &str, children: Vec<Tree>) -> Tree {
    Tree::new("beagle:container").with_id(id).with_children(children)
}

/// Log sink shared with a `tracing-subscriber` fmt layer.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }

    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Captures log output at `level` and above for the current thread.
pub fn capture_logs(level: tracing::Level) -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
