//! Transport seam for fetching view trees.
//!
//! The engine never talks HTTP directly: every request goes through an
//! [`HttpClient`], so hosts can plug in their own client (auth, cookies,
//! mocks). [`ReqwestClient`] is the default implementation.

mod client;
mod headers;
mod url_builder;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::ReqwestClient;
pub use headers::{default_headers, PLATFORM_HEADER};
pub use url_builder::UrlBuilder;

/// HTTP verbs accepted for view requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request options handed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `max-age` from the `Cache-Control` header, if the server sent one.
    pub fn max_age_seconds(&self) -> Option<u64> {
        self.header("cache-control")?
            .split(',')
            .filter_map(|directive| directive.trim().strip_prefix("max-age="))
            .find_map(|value| value.trim().parse().ok())
    }
}

/// Failures of the transport itself (no response available).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),
}

/// Fetch-like transport: `(url, { method, headers }) -> response`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
